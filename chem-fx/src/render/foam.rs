//! 泡沫生成：泡沫层从锚点向上堆积，表面有摆动的气泡。

use std::f32::consts::TAU;

use super::{Easing, Primitive, RenderContext, Rgba, Stroke, between, scaled_count, unit};
use crate::effect::{BubbleSize, FoamParams, FoamProduction};
use crate::error::RenderError;
use crate::geometry::Vec2;

const STATIC_BUBBLES: usize = 4;

fn bubble_radius(size: BubbleSize) -> f32 {
    match size {
        BubbleSize::Small => 2.5,
        BubbleSize::Medium => 4.5,
        BubbleSize::Large => 7.0,
    }
}

pub(super) fn render(
    base: &FoamProduction,
    params: &FoamParams,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let color = Rgba::parse(&base.color)?;
    let density = unit(base.density);
    let envelope = ctx.envelope();
    let origin = ctx.anchor.position;
    let half_width = ctx.anchor.radius;
    let count = scaled_count(params.bubble_count, density, ctx.detail);
    let radius = bubble_radius(base.bubble_size);

    // 减弱动态时直接显示最终高度
    let growth = if ctx.reduced_motion {
        1.0
    } else {
        Easing::EaseOutCubic.apply(ctx.progress)
    };
    let head_height = ctx.container.height * params.rise_height * density * growth;

    let mut primitives = Vec::with_capacity(count + 1);
    primitives.push(Primitive::Ellipse {
        center: origin.offset(0.0, -head_height * 0.5),
        radii: Vec2::new(half_width, (head_height * 0.5).max(1.0)),
        fill: color.fade(0.5 * density * envelope),
        stroke: None,
    });

    let outline = Stroke {
        color: color.fade(0.8 * envelope),
        width: 1.0,
    };

    if ctx.reduced_motion {
        for i in 0..count.min(STATIC_BUBBLES) {
            let dx = (i as f32 - 1.5) * half_width * 0.4;
            primitives.push(Primitive::Ellipse {
                center: origin.offset(dx, -head_height),
                radii: Vec2::new(radius, radius * 0.9),
                fill: color.fade(0.25 * density * envelope),
                stroke: Some(outline),
            });
        }
        return Ok(primitives);
    }

    let mut rng = ctx.rng();
    for _ in 0..count {
        let phase = rng.f32();
        let dx = between(&mut rng, -1.0, 1.0) * half_width;
        let depth = rng.f32();
        let r = radius * between(&mut rng, 0.7, 1.3);

        // 气泡依次冒出
        let grow = Easing::EaseOutCubic.apply(ctx.progress * 1.5 - phase * 0.5);
        let wobble = (ctx.progress * TAU * 3.0 + phase * TAU).sin() * params.wobble;

        primitives.push(Primitive::Ellipse {
            center: origin.offset(dx + wobble, -head_height * depth),
            radii: Vec2::new(r * grow, r * grow * 0.9),
            fill: color.fade(0.25 * density * envelope),
            stroke: Some(outline),
        });
    }

    Ok(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::render::tests::anchor;

    fn foam(density: f32) -> FoamProduction {
        FoamProduction {
            color: "white".to_string(),
            density,
            bubble_size: BubbleSize::Medium,
            stability: 4.0,
        }
    }

    fn params() -> FoamParams {
        FoamParams {
            bubble_count: 10,
            rise_height: 0.25,
            wobble: 2.0,
        }
    }

    fn head_height(primitives: &[Primitive]) -> f32 {
        match &primitives[0] {
            Primitive::Ellipse { radii, .. } => radii.y * 2.0,
            other => panic!("Expected Ellipse, got {:?}", other),
        }
    }

    #[test]
    fn test_foam_head_grows() {
        let anchor = anchor();
        let early = render(
            &foam(1.0),
            &params(),
            &RenderContext::new(0.2, &anchor, Size::default()),
        )
        .unwrap();
        let late = render(
            &foam(1.0),
            &params(),
            &RenderContext::new(0.8, &anchor, Size::default()),
        )
        .unwrap();

        assert!(head_height(&early) < head_height(&late));
        assert_eq!(late.len(), 11);
    }

    #[test]
    fn test_reduced_motion_shows_final_height() {
        let anchor = anchor();
        let ctx = RenderContext::new(0.2, &anchor, Size::default()).with_reduced_motion(true);
        let primitives = render(&foam(1.0), &params(), &ctx).unwrap();

        let expected = Size::default().height * 0.25;
        assert!((head_height(&primitives) - expected).abs() < 1e-3);
        assert_eq!(primitives.len(), 1 + STATIC_BUBBLES);
    }
}
