//! 体积变化：液面椭圆缩放到目标系数，外圈涟漪指示方向。

use super::{Easing, Primitive, RenderContext, Rgba, Stroke};
use crate::effect::{VolumeChange, VolumeParams};
use crate::error::RenderError;
use crate::geometry::Vec2;

const LIQUID: Rgba = Rgba::new(0.36, 0.62, 0.93, 0.55);
/// 涟漪的最大扩张比例
const RIPPLE_REACH: f32 = 0.4;

pub(super) fn render(
    base: &VolumeChange,
    params: &VolumeParams,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let envelope = ctx.envelope();
    let center = ctx.anchor.position;
    let target = base.scale_factor.max(0.0);
    let scale = 1.0 + (target - 1.0) * Easing::EaseInOutCubic.apply(ctx.progress);
    let radius = ctx.anchor.radius * scale;

    let rings = if ctx.reduced_motion {
        0
    } else {
        params.ring_count as usize
    };
    let mut primitives = Vec::with_capacity(rings + 2);

    primitives.push(Primitive::Ellipse {
        center,
        radii: Vec2::new(radius, radius * 0.35),
        fill: LIQUID.fade(envelope),
        stroke: Some(Stroke {
            color: LIQUID.with_alpha(0.9 * envelope),
            width: 1.5,
        }),
    });

    let expanding = target >= 1.0;
    for ring in 0..rings {
        let phase = (ctx.progress * 2.0 + ring as f32 / rings as f32).fract();
        // 收缩时涟漪向内
        let reach = if expanding { phase } else { 1.0 - phase };
        let ring_radius = radius * (1.0 + RIPPLE_REACH * reach);
        primitives.push(Primitive::Ellipse {
            center,
            radii: Vec2::new(ring_radius, ring_radius * 0.35),
            fill: Rgba::TRANSPARENT,
            stroke: Some(Stroke {
                color: LIQUID.with_alpha(0.6 * (1.0 - phase) * envelope),
                width: 1.0,
            }),
        });
    }

    primitives.push(Primitive::Text {
        position: center.offset(radius + 8.0, 0.0),
        text: format!("×{:.2}", target),
        color: LIQUID.with_alpha(envelope),
        size: 13.0,
    });

    Ok(primitives)
}
