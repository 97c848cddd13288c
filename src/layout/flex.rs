//! Flex arrangement: weighted main-axis sizing, justification and alignment.

use crate::core::geometry::Rect;
use crate::layout::auto_size::{margin_on, outer_size};
use crate::layout::node::{Align, Axis, FlexProps, Justify, LayoutNode};

/// Split `leftover` between `weights`, flooring each share and handing the
/// remainder out one unit at a time to the earliest weighted entries.
///
/// Zero weights receive nothing. The shares sum to `leftover` whenever at least
/// one weight is non-zero.
pub fn distribute(leftover: i32, weights: &[u32]) -> Vec<i32> {
    let leftover = i64::from(leftover.max(0));
    let total: i64 = weights.iter().map(|w| i64::from(*w)).sum();
    if total == 0 {
        return vec![0; weights.len()];
    }

    let mut shares: Vec<i64> = weights
        .iter()
        .map(|w| leftover * i64::from(*w) / total)
        .collect();
    let mut remainder = leftover - shares.iter().sum::<i64>();
    for (share, weight) in shares.iter_mut().zip(weights) {
        if remainder == 0 {
            break;
        }
        if *weight > 0 {
            *share += 1;
            remainder -= 1;
        }
    }
    shares
        .into_iter()
        .map(|share| i32::try_from(share).unwrap_or(i32::MAX))
        .collect()
}

/// Leading offset and extra between-item spacing for `justify`.
pub fn justify_offsets(justify: Justify, free: i32, count: usize) -> (i32, i32) {
    let free = free.max(0);
    let n = i32::try_from(count).unwrap_or(i32::MAX);
    match justify {
        Justify::Start => (0, 0),
        Justify::Center => (free / 2, 0),
        Justify::End => (free, 0),
        Justify::SpaceBetween if n > 1 => (0, free / (n - 1)),
        Justify::SpaceBetween => (0, 0),
        Justify::SpaceAround if n > 0 => {
            let gap = free / n;
            (gap / 2, gap)
        }
        Justify::SpaceEvenly if n > 0 => {
            let gap = free / n.saturating_add(1);
            (gap, gap)
        }
        Justify::SpaceAround | Justify::SpaceEvenly => (0, 0),
    }
}

/// Margin-box slots for `children` inside `content`.
pub(crate) fn arrange(props: &FlexProps, children: &[LayoutNode], content: Rect) -> Vec<Rect> {
    if children.is_empty() {
        return Vec::new();
    }

    let main_axis = props.direction;
    let cross_axis = main_axis.cross();
    let (main_size, cross_size) = match main_axis {
        Axis::Horizontal => (content.width, content.height),
        Axis::Vertical => (content.height, content.width),
    };
    let count = children.len();
    let gap = props.gap.max(0);
    let gaps_total = gap.saturating_mul(i32::try_from(count - 1).unwrap_or(i32::MAX));

    let weights: Vec<u32> = children
        .iter()
        .map(|child| child.props.flex_weight())
        .collect();

    // Fixed children use their outer size; flexible ones start at their margins.
    let mut main_sizes: Vec<i32> = children
        .iter()
        .zip(&weights)
        .map(|(child, weight)| {
            if *weight > 0 {
                margin_on(child, main_axis)
            } else {
                outer_size(child, main_axis)
            }
        })
        .collect();
    let committed = saturating_sum(&main_sizes).saturating_add(gaps_total);
    let shares = distribute(main_size - committed, &weights);
    for (size, share) in main_sizes.iter_mut().zip(shares) {
        *size = size.saturating_add(share);
    }

    let used = saturating_sum(&main_sizes).saturating_add(gaps_total);
    let (mut cursor, extra) = justify_offsets(props.justify, main_size - used, count);

    let mut slots = Vec::with_capacity(count);
    for (child, main_outer) in children.iter().zip(main_sizes) {
        let align = child.props.align_self.unwrap_or(props.align);
        let (cross_offset, cross_outer) = cross_placement(child, cross_axis, align, cross_size);
        let slot = match main_axis {
            Axis::Horizontal => Rect::new(
                content.x.saturating_add(cursor),
                content.y.saturating_add(cross_offset),
                main_outer,
                cross_outer,
            ),
            Axis::Vertical => Rect::new(
                content.x.saturating_add(cross_offset),
                content.y.saturating_add(cursor),
                cross_outer,
                main_outer,
            ),
        };
        slots.push(slot);
        cursor = cursor
            .saturating_add(main_outer)
            .saturating_add(gap)
            .saturating_add(extra);
    }
    slots
}

fn saturating_sum(values: &[i32]) -> i32 {
    values.iter().fold(0i32, |total, value| total.saturating_add(*value))
}

fn cross_placement(child: &LayoutNode, axis: Axis, align: Align, cross_size: i32) -> (i32, i32) {
    if align == Align::Stretch && child.props.size(axis).is_none() {
        return (0, cross_size.max(0));
    }
    let outer = outer_size(child, axis);
    let free = (cross_size - outer).max(0);
    let offset = match align {
        Align::Start | Align::Stretch => 0,
        Align::Center => free / 2,
        Align::End => free,
    };
    (offset, outer)
}

#[cfg(test)]
mod tests {
    use super::{arrange, distribute, justify_offsets};
    use crate::core::geometry::Rect;
    use crate::layout::node::{Align, FlexProps, Justify, LayoutNode, NodeKind};
    use proptest::prelude::*;

    fn fixed(width: i32) -> LayoutNode {
        LayoutNode::new(NodeKind::Container).width(width).height(2)
    }

    #[test]
    fn remainder_goes_to_earliest_weights() {
        assert_eq!(distribute(10, &[1, 1, 1]), vec![4, 3, 3]);
        assert_eq!(distribute(10, &[0, 1, 1]), vec![0, 5, 5]);
        assert_eq!(distribute(7, &[2, 1]), vec![5, 2]);
        assert_eq!(distribute(-3, &[1, 1]), vec![0, 0]);
        assert_eq!(distribute(5, &[0, 0]), vec![0, 0]);
    }

    #[test]
    fn justify_variants() {
        assert_eq!(justify_offsets(Justify::Start, 12, 3), (0, 0));
        assert_eq!(justify_offsets(Justify::Center, 12, 3), (6, 0));
        assert_eq!(justify_offsets(Justify::End, 12, 3), (12, 0));
        assert_eq!(justify_offsets(Justify::SpaceBetween, 12, 3), (0, 6));
        assert_eq!(justify_offsets(Justify::SpaceAround, 12, 3), (2, 4));
        assert_eq!(justify_offsets(Justify::SpaceEvenly, 12, 3), (3, 3));
        assert_eq!(justify_offsets(Justify::SpaceBetween, 12, 1), (0, 0));
    }

    #[test]
    fn row_places_fixed_children_with_gap_and_center_justify() {
        let props = FlexProps::row().gap(1).justify(Justify::Center).align(Align::Start);
        let children = vec![fixed(3), fixed(4)];
        let slots = arrange(&props, &children, Rect::new(0, 0, 20, 5));
        // free = 20 - (3 + 4 + 1) = 12 → offset 6
        assert_eq!(slots, vec![Rect::new(6, 0, 3, 2), Rect::new(10, 0, 4, 2)]);
    }

    #[test]
    fn cross_alignment_and_align_self() {
        let props = FlexProps::row().align(Align::End);
        let children = vec![
            fixed(2),
            fixed(2).align_self(Align::Center),
            LayoutNode::new(NodeKind::Container).width(2).align_self(Align::Stretch),
        ];
        let slots = arrange(&props, &children, Rect::new(0, 0, 10, 6));
        assert_eq!(slots[0], Rect::new(0, 4, 2, 2));
        assert_eq!(slots[1], Rect::new(2, 2, 2, 2));
        assert_eq!(slots[2], Rect::new(4, 0, 2, 6));
    }

    #[test]
    fn margins_reduce_flex_leftover() {
        let props = FlexProps::column();
        let children = vec![
            LayoutNode::new(NodeKind::Container).flex(1).margin(1),
            LayoutNode::new(NodeKind::Container).flex(1),
        ];
        let slots = arrange(&props, &children, Rect::new(0, 0, 8, 12));
        // leftover = 12 - 2 (margins) = 10 → 5 + 5, first slot also carries its margins
        assert_eq!(slots, vec![Rect::new(0, 0, 8, 7), Rect::new(0, 7, 8, 5)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn weighted_shares_fill_leftover_exactly(
            leftover in 0i32..500,
            weights in proptest::collection::vec(0u32..6, 1..8)
        ) {
            let shares = distribute(leftover, &weights);
            prop_assert_eq!(shares.len(), weights.len());
            if weights.iter().any(|w| *w > 0) {
                prop_assert_eq!(shares.iter().sum::<i32>(), leftover);
            }
            for (share, weight) in shares.iter().zip(&weights) {
                if *weight == 0 {
                    prop_assert_eq!(*share, 0);
                }
            }
        }
    }
}
