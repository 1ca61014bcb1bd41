//! 溢出：容器底部扩散的液洼，伴随向两侧飞溅的液滴。

use std::f32::consts::PI;

use super::{Easing, Primitive, RenderContext, Rgba, between, scaled_count, unit};
use crate::effect::{Spill, SpillParams};
use crate::error::RenderError;
use crate::geometry::Vec2;

const SPILL_COLOR: Rgba = Rgba::new(0.36, 0.62, 0.93, 0.6);
const DROPLET_RADIUS: f32 = 2.5;

pub(super) fn render(
    base: &Spill,
    params: &SpillParams,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let amount = unit(base.amount);
    let spread = base.spread_radius.max(0.0) * amount;
    let origin = ctx.anchor.position;
    // 液洼不会淡出
    let fade_in = unit(ctx.progress / 0.1);

    let growth = if ctx.reduced_motion {
        1.0
    } else {
        Easing::EaseOutQuad.apply(ctx.progress)
    };
    let count = if ctx.reduced_motion {
        0
    } else {
        scaled_count(params.droplet_count, amount, ctx.detail)
    };

    let mut primitives = Vec::with_capacity(count + 1);
    primitives.push(Primitive::Ellipse {
        center: origin,
        radii: Vec2::new(spread * growth, spread * growth * 0.3),
        fill: SPILL_COLOR.fade(fade_in),
        stroke: None,
    });

    let mut rng = ctx.rng();
    for _ in 0..count {
        let phase = rng.f32();
        let direction = if rng.f32() < 0.5 { -1.0 } else { 1.0 };
        let reach = spread * between(&mut rng, 0.4, 1.0);
        let height = spread * 0.5 * between(&mut rng, 0.5, 1.0);

        // 液滴沿抛物线飞出后落地
        let t = unit(ctx.progress * 1.6 - phase * 0.6);
        primitives.push(Primitive::Circle {
            center: origin.offset(direction * reach * t, -(PI * t).sin() * height),
            radius: DROPLET_RADIUS,
            fill: SPILL_COLOR.fade((1.0 - t) * fade_in),
        });
    }

    Ok(primitives)
}
