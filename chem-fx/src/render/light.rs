//! 发光：多层径向光晕，按脉冲频率呼吸并带轻微闪烁。

use std::f32::consts::TAU;

use fastrand::Rng;

use super::{Primitive, RenderContext, Rgba, unit};
use crate::effect::{LightEmission, LightParams};
use crate::error::RenderError;

/// 脉冲振幅（相对半径）
const PULSE_AMPLITUDE: f32 = 0.12;
/// 每秒闪烁采样次数
const FLICKER_RATE: f32 = 12.0;
/// 每层光晕的半径增量
const LAYER_GROWTH: f32 = 0.35;

pub(super) fn render(
    base: &LightEmission,
    params: &LightParams,
    duration: f32,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let color = Rgba::parse(&base.color)?;
    let alpha = unit(base.intensity) * ctx.envelope();
    let center = ctx.anchor.position;
    let radius = base.radius.max(0.0);

    if ctx.reduced_motion {
        return Ok(vec![Primitive::RadialGradient {
            center,
            radius,
            inner: color.fade(alpha * 0.6),
            outer: color.with_alpha(0.0),
        }]);
    }

    let seconds = ctx.progress * duration.max(0.0);
    let pulse = 1.0 + PULSE_AMPLITUDE * (seconds * params.pulse_frequency * TAU).sin();
    let step = (seconds * FLICKER_RATE) as u64;
    let flicker = 1.0 - unit(params.flicker) * Rng::with_seed(ctx.seed.wrapping_add(step)).f32();

    let layers = params.glow_layers as usize;
    let mut primitives = Vec::with_capacity(layers + 1);

    // 由外到内绘制
    for layer in (0..layers).rev() {
        let scale = 1.0 + layer as f32 * LAYER_GROWTH;
        primitives.push(Primitive::RadialGradient {
            center,
            radius: radius * scale * pulse,
            inner: color.fade(alpha * flicker / (layer as f32 + 1.0)),
            outer: color.with_alpha(0.0),
        });
    }
    primitives.push(Primitive::Circle {
        center,
        radius: radius * 0.15 * pulse,
        fill: Rgba::WHITE.lerp(color, 0.3).fade(alpha * flicker),
    });

    Ok(primitives)
}
