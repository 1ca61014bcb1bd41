//! 气体生成：气泡从锚点上升并逐渐消散。

use std::f32::consts::TAU;

use super::{Easing, Primitive, RenderContext, Rgba, between, scaled_count, unit};
use crate::effect::{GasParams, GasProduction};
use crate::error::RenderError;
use crate::geometry::Vec2;

/// 减弱动态时保留的静态气泡上限
const STATIC_BUBBLES: usize = 3;
/// 上升高度占容器高度的比例
const RISE_RATIO: f32 = 0.6;
const LABEL_COLOR: Rgba = Rgba::rgb(0.2, 0.22, 0.26);

pub(super) fn render(
    base: &GasProduction,
    params: &GasParams,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let color = Rgba::parse(&base.color)?;
    let intensity = unit(base.intensity);
    let count = scaled_count(params.particle_count, intensity, ctx.detail);
    let envelope = ctx.envelope();
    let origin = ctx.anchor.position;
    let spread = ctx.anchor.radius * params.spread;
    let rise_height = ctx.container.height * RISE_RATIO;

    let mut primitives = Vec::with_capacity(count + 1);

    if ctx.reduced_motion {
        for i in 0..count.min(STATIC_BUBBLES) {
            let dx = (i as f32 - 1.0) * spread * 0.5;
            let dy = -(i as f32 + 1.0) * params.particle_size * 3.0;
            primitives.push(Primitive::Circle {
                center: origin.offset(dx, dy),
                radius: params.particle_size * 1.5,
                fill: color.fade(intensity * envelope),
            });
        }
    } else {
        let mut rng = ctx.rng();
        for _ in 0..count {
            let phase = rng.f32();
            let dx = between(&mut rng, -spread, spread);
            let size = params.particle_size * between(&mut rng, 0.6, 1.4);

            // 每个气泡在整个时长内上升 rise_cycles 次
            let t = (ctx.progress * params.rise_cycles + phase).fract();
            let lift = Easing::EaseOutQuad.apply(t) * rise_height;
            let sway = (t * TAU * 2.0 + phase * TAU).sin() * spread * 0.15;

            primitives.push(Primitive::Circle {
                center: origin.offset(dx + sway, -lift),
                radius: size * (1.0 + t * 0.5),
                fill: color.fade(intensity * envelope * (1.0 - t)),
            });
        }
    }

    if !base.gas.is_empty() {
        primitives.push(Primitive::Text {
            position: Vec2::new(origin.x + spread + 12.0, origin.y - ctx.anchor.radius),
            text: format!("{}↑", base.gas),
            color: LABEL_COLOR.fade(envelope),
            size: 14.0,
        });
    }

    Ok(primitives)
}
