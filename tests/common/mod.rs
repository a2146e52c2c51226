//! Shared fixtures for splittext integration tests.

#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)]

use splittext::unicode::{Segment, segments};
use splittext::{ChannelObserver, MemorySurface, NodeId, ResizeEntry, Surface};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// An 800px document with `markup` mounted in the body.
pub fn mount(markup: &str) -> (MemorySurface, NodeId) {
    init_tracing();
    let mut surface = MemorySurface::new(800.0);
    let target = surface.mount(markup);
    (surface, target)
}

/// Left/top of every visible grapheme in the unsplit text, in order.
pub fn original_positions(surface: &MemorySurface, target: NodeId) -> Vec<(f32, f32)> {
    let mut positions = Vec::new();
    for node in surface.text_nodes(&target) {
        let text = surface.text(&node);
        for seg in segments(&text) {
            if let Segment::Unit { offset, text: unit } = seg {
                let rect = surface.range_rect(&node, offset..offset + unit.len());
                positions.push((rect.left, rect.top));
            }
        }
    }
    positions
}

/// Left/top of each unit node.
pub fn unit_positions(surface: &MemorySurface, units: &[NodeId]) -> Vec<(f32, f32)> {
    units
        .iter()
        .map(|n| {
            let rect = surface.element_rect(n);
            (rect.left, rect.top)
        })
        .collect()
}

/// Assert two position lists match within `tolerance`.
pub fn assert_positions_eq(actual: &[(f32, f32)], expected: &[(f32, f32)], tolerance: f32) {
    assert_eq!(actual.len(), expected.len(), "unit count differs");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a.0 - e.0).abs() <= tolerance && (a.1 - e.1).abs() <= tolerance,
            "unit {i}: {a:?} != {e:?}"
        );
    }
}

/// Text with all layout whitespace removed.
pub fn visible(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

/// Resize `node` and notify observers the way a host would.
pub fn resize(
    surface: &mut MemorySurface,
    observer: &ChannelObserver<NodeId>,
    node: NodeId,
    width: f32,
) -> usize {
    surface.set_width(node, width);
    let height = surface.element_rect(&node).height;
    observer.notify(&node, ResizeEntry::new(width, height))
}
