//! 质地变化：表面色调 + 沉降的颗粒，凝胶/平滑质地额外有表面波纹。
//!
//! 粘度越高，波纹振幅越小。

use std::f32::consts::TAU;

use super::{Easing, Primitive, RenderContext, Rgba, between, scaled_count, unit};
use crate::effect::{TextureChange, TextureKind, TextureParams};
use crate::error::RenderError;
use crate::geometry::Vec2;

const STATIC_GRAINS: usize = 6;
const RIPPLE_POINTS: usize = 10;

/// 每种质地的颗粒密度
fn grain_factor(texture: TextureKind) -> f32 {
    match texture {
        TextureKind::Smooth => 0.0,
        TextureKind::Gel => 0.2,
        TextureKind::Crystalline => 0.5,
        TextureKind::Powdery => 0.8,
        TextureKind::Grainy => 1.0,
    }
}

fn has_ripples(texture: TextureKind) -> bool {
    matches!(texture, TextureKind::Smooth | TextureKind::Gel)
}

fn grain(texture: TextureKind, center: Vec2, size: f32, color: Rgba) -> Primitive {
    match texture {
        // 晶体用菱形
        TextureKind::Crystalline => Primitive::Polyline {
            points: vec![
                center.offset(0.0, -size),
                center.offset(size * 0.6, 0.0),
                center.offset(0.0, size),
                center.offset(-size * 0.6, 0.0),
                center.offset(0.0, -size),
            ],
            color,
            width: 1.0,
        },
        _ => Primitive::Circle {
            center,
            radius: size * 0.5,
            fill: color,
        },
    }
}

pub(super) fn render(
    base: &TextureChange,
    params: &TextureParams,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let color = Rgba::parse(&base.color)?;
    let viscosity = unit(base.viscosity);
    let center = ctx.anchor.position;
    let radius = ctx.anchor.radius;
    let fade_in = unit(ctx.progress * 3.0);

    let grains = scaled_count(params.grain_count, grain_factor(base.texture), ctx.detail);
    let ripples = if ctx.reduced_motion || !has_ripples(base.texture) {
        0
    } else {
        params.ripple_count as usize
    };

    let mut primitives = Vec::with_capacity(grains + ripples + 1);
    primitives.push(Primitive::Ellipse {
        center,
        radii: Vec2::new(radius, radius * 0.5),
        fill: color.fade(0.4 * fade_in),
        stroke: None,
    });

    let grain_color = color.fade(0.9 * fade_in);
    let mut rng = ctx.rng();
    for index in 0..grains {
        let phase = rng.f32();
        let x = between(&mut rng, -1.0, 1.0) * radius;
        let rest_y = between(&mut rng, -0.4, 0.4) * radius;
        let size = between(&mut rng, 1.0, 2.5);

        if ctx.reduced_motion {
            if index < STATIC_GRAINS {
                primitives.push(grain(base.texture, center.offset(x, rest_y), size, grain_color));
            }
            continue;
        }

        // 颗粒从上方落下并弹跳沉降
        let settle = Easing::EaseOutBounce.apply(ctx.progress * 1.4 - phase * 0.4);
        let start_y = rest_y - radius * 0.8;
        let y = start_y + (rest_y - start_y) * settle;
        primitives.push(grain(base.texture, center.offset(x, y), size, grain_color));
    }

    let amplitude = params.ripple_amplitude * (1.0 - viscosity);
    for ripple in 0..ripples {
        let baseline = center.y + (ripple as f32 - (ripples - 1) as f32 / 2.0) * radius * 0.25;
        let points = (0..RIPPLE_POINTS)
            .map(|p| {
                let fx = p as f32 / (RIPPLE_POINTS - 1) as f32;
                let phase = fx * TAU + ctx.progress * TAU * 2.0 + ripple as f32;
                Vec2::new(
                    center.x - radius * 0.8 + fx * radius * 1.6,
                    baseline + phase.sin() * amplitude,
                )
            })
            .collect();
        primitives.push(Primitive::Polyline {
            points,
            color: color.fade(0.5 * fade_in),
            width: 1.0,
        });
    }

    Ok(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::render::tests::anchor;

    fn params() -> TextureParams {
        TextureParams {
            grain_count: 20,
            ripple_count: 3,
            ripple_amplitude: 3.0,
        }
    }

    fn texture(kind: TextureKind, viscosity: f32) -> TextureChange {
        TextureChange {
            texture: kind,
            color: "#88cc88".to_string(),
            viscosity,
        }
    }

    #[test]
    fn test_grain_density_per_texture() {
        let anchor = anchor();
        let ctx = RenderContext::new(0.5, &anchor, Size::default());
        let count = |kind| render(&texture(kind, 0.5), &params(), &ctx).unwrap().len();

        // 色调 + 颗粒 + 波纹
        assert_eq!(count(TextureKind::Smooth), 1 + 3);
        assert_eq!(count(TextureKind::Gel), 1 + 4 + 3);
        assert_eq!(count(TextureKind::Crystalline), 1 + 10);
        assert_eq!(count(TextureKind::Grainy), 1 + 20);
    }

    #[test]
    fn test_viscosity_damps_ripples() {
        let anchor = anchor();
        let ctx = RenderContext::new(0.3, &anchor, Size::default());
        let solid = render(&texture(TextureKind::Smooth, 1.0), &params(), &ctx).unwrap();

        for primitive in &solid[1..] {
            match primitive {
                Primitive::Polyline { points, .. } => {
                    let first_y = points[0].y;
                    assert!(points.iter().all(|p| (p.y - first_y).abs() < 1e-4));
                }
                other => panic!("Expected Polyline, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_crystalline_grains_are_diamonds() {
        let anchor = anchor();
        let ctx = RenderContext::new(1.0, &anchor, Size::default());
        let primitives = render(&texture(TextureKind::Crystalline, 0.0), &params(), &ctx).unwrap();
        assert!(primitives[1..].iter().all(|p| p.name() == "polyline"));
    }
}
