//! 温度变化：升温时热浪上升，降温时冷波下沉，外加色调与读数标签。

use std::f32::consts::TAU;

use super::{Primitive, RenderContext, Rgba, unit};
use crate::effect::{TemperatureChange, TemperatureParams};
use crate::error::RenderError;
use crate::geometry::Vec2;

const WARM: Rgba = Rgba::rgb(1.0, 0.42, 0.24);
const COOL: Rgba = Rgba::rgb(0.3, 0.65, 1.0);
/// 视为满强度的温度变化量（°C）
const FULL_SCALE_DELTA: f32 = 50.0;
const WAVE_POINTS: usize = 12;

pub(super) fn render(
    base: &TemperatureChange,
    params: &TemperatureParams,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let heating = base.delta >= 0.0;
    let tint = if heating { WARM } else { COOL };
    let magnitude = unit(base.delta.abs() / FULL_SCALE_DELTA);
    let envelope = ctx.envelope();
    let center = ctx.anchor.position;
    let radius = ctx.anchor.radius;

    let waves = if ctx.reduced_motion {
        0
    } else {
        params.wave_count as usize
    };
    let mut primitives = Vec::with_capacity(waves + 2);

    primitives.push(Primitive::RadialGradient {
        center,
        radius: radius * 1.2,
        inner: tint.fade(0.45 * magnitude * envelope),
        outer: tint.with_alpha(0.0),
    });

    let spacing = radius * 0.5;
    let amplitude = params.shimmer_amplitude * (0.3 + 0.7 * magnitude);
    let direction = if heating { -1.0 } else { 1.0 };
    for wave in 0..waves {
        // 波纹沿方向循环移动，越远越淡
        let offset = (wave as f32 + ctx.progress * 2.0).rem_euclid(waves as f32);
        let baseline = center.y + direction * offset * spacing;
        let fade = 1.0 - offset / waves as f32;

        let points = (0..WAVE_POINTS)
            .map(|p| {
                let fx = p as f32 / (WAVE_POINTS - 1) as f32;
                let phase = fx * TAU * 1.5 + ctx.progress * TAU * 4.0 + wave as f32;
                Vec2::new(
                    center.x - radius + fx * radius * 2.0,
                    baseline + phase.sin() * amplitude,
                )
            })
            .collect();

        primitives.push(Primitive::Polyline {
            points,
            color: tint.fade(fade * (0.3 + 0.7 * magnitude) * envelope),
            width: 1.5,
        });
    }

    primitives.push(Primitive::Text {
        position: center.offset(-radius * 0.3, -radius - 8.0),
        text: format!("{:+.0}°C", base.delta),
        color: tint.fade(envelope),
        size: 14.0,
    });

    Ok(primitives)
}
