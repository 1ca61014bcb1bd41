//! 物态变化：粒子从初始物态的排布过渡到最终物态的排布。
//!
//! - 固态：规则网格
//! - 液态：锚点下方的松散聚集
//! - 气态：向上大范围散开

use std::f32::consts::TAU;

use super::{Easing, Primitive, RenderContext, Rgba, scaled_count};
use crate::effect::{MatterState, StateChange, StateChangeParams};
use crate::error::RenderError;
use crate::geometry::Vec2;

const PARTICLE_RADIUS: f32 = 3.0;
const LABEL_COLOR: Rgba = Rgba::rgb(0.2, 0.22, 0.26);

fn state_color(state: MatterState) -> Rgba {
    match state {
        MatterState::Solid => Rgba::rgb(0.69, 0.72, 0.75),
        MatterState::Liquid => Rgba::rgb(0.3, 0.6, 0.95),
        MatterState::Gas => Rgba::new(0.88, 0.91, 0.94, 0.6),
    }
}

fn state_name(state: MatterState) -> &'static str {
    match state {
        MatterState::Solid => "solid",
        MatterState::Liquid => "liquid",
        MatterState::Gas => "gas",
    }
}

/// 第 `index` 个粒子在某物态下的位置
///
/// `a`、`b` 是该粒子固定的两个随机数，保证同一粒子在每帧的位置一致。
fn arrangement(
    state: MatterState,
    index: usize,
    count: usize,
    center: Vec2,
    radius: f32,
    (a, b): (f32, f32),
) -> Vec2 {
    match state {
        MatterState::Solid => {
            let cols = (count as f32).sqrt().ceil().max(1.0) as usize;
            let rows = count.div_ceil(cols);
            let spacing = radius * 1.2 / cols as f32;
            let col = (index % cols) as f32 - (cols - 1) as f32 / 2.0;
            let row = (index / cols) as f32 - rows.saturating_sub(1) as f32 / 2.0;
            center.offset(col * spacing, row * spacing)
        }
        MatterState::Liquid => {
            let angle = a * TAU;
            let distance = radius * 0.8 * b.sqrt();
            center.offset(
                angle.cos() * distance,
                angle.sin() * distance * 0.5 + radius * 0.4,
            )
        }
        MatterState::Gas => center.offset((a * 2.0 - 1.0) * radius * 1.5, -(0.5 + b * 1.5) * radius),
    }
}

pub(super) fn render(
    base: &StateChange,
    params: &StateChangeParams,
    ctx: &RenderContext<'_>,
) -> Result<Vec<Primitive>, RenderError> {
    let envelope = ctx.envelope();
    let center = ctx.anchor.position;
    let radius = ctx.anchor.radius;
    let count = scaled_count(params.particle_count, 1.0, ctx.detail);
    let t = Easing::EaseInOutSine.apply(ctx.progress);
    let color = state_color(base.initial_state).lerp(state_color(base.final_state), t);

    let mut primitives = Vec::with_capacity(count + 1);

    if ctx.reduced_motion {
        // 只做颜色交叉淡化
        if count > 0 {
            primitives.push(Primitive::Ellipse {
                center,
                radii: Vec2::new(radius, radius * 0.6),
                fill: color.fade(envelope),
                stroke: None,
            });
        }
    } else {
        let mut rng = ctx.rng();
        for index in 0..count {
            let from_seed = (rng.f32(), rng.f32());
            let to_seed = (rng.f32(), rng.f32());
            let from = arrangement(base.initial_state, index, count, center, radius, from_seed);
            let to = arrangement(base.final_state, index, count, center, radius, to_seed);

            primitives.push(Primitive::Circle {
                center: from.lerp(to, t),
                radius: PARTICLE_RADIUS,
                fill: color.fade(envelope),
            });
        }
    }

    primitives.push(Primitive::Text {
        position: center.offset(-radius, -radius - 8.0),
        text: format!(
            "{} → {}",
            state_name(base.initial_state),
            state_name(base.final_state)
        ),
        color: LABEL_COLOR.fade(envelope),
        size: 14.0,
    });

    Ok(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::render::tests::anchor;

    fn melt() -> StateChange {
        StateChange {
            initial_state: MatterState::Solid,
            final_state: MatterState::Liquid,
        }
    }

    fn particle_positions(primitives: &[Primitive]) -> Vec<Vec2> {
        primitives
            .iter()
            .filter(|p| p.name() == "circle")
            .map(Primitive::position)
            .collect()
    }

    #[test]
    fn test_starts_in_lattice_and_moves() {
        let anchor = anchor();
        let params = StateChangeParams { particle_count: 9 };

        let start = render(&melt(), &params, &RenderContext::new(0.0, &anchor, Size::default()))
            .unwrap();
        let end = render(&melt(), &params, &RenderContext::new(1.0, &anchor, Size::default()))
            .unwrap();

        let start = particle_positions(&start);
        assert_eq!(start.len(), 9);
        // 3x3 网格的中心粒子就在锚点上
        assert_eq!(start[4], anchor.position);
        assert_ne!(start, particle_positions(&end));
    }

    #[test]
    fn test_label() {
        let anchor = anchor();
        let params = StateChangeParams { particle_count: 4 };
        let primitives =
            render(&melt(), &params, &RenderContext::new(0.5, &anchor, Size::default())).unwrap();

        match primitives.last() {
            Some(Primitive::Text { text, .. }) => assert_eq!(text, "solid → liquid"),
            other => panic!("Expected Text, got {:?}", other),
        }
    }

    #[test]
    fn test_lattice_without_particles() {
        let position = arrangement(
            MatterState::Solid,
            0,
            0,
            Vec2::new(10.0, 10.0),
            5.0,
            (0.5, 0.5),
        );
        assert!(position.x.is_finite() && position.y.is_finite());
    }
}
