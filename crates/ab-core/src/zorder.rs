//! Re-stacking shared by artboards, widgets and components.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

/// Anything with an identity and a stacking index.
pub trait Stacked {
    fn stack_id(&self) -> EntityId;
    fn z_index(&self) -> i32;
    fn set_z_index(&mut self, z: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZOrderOp {
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
}

/// Apply `op` to `target` within `items`.
///
/// Items are sorted by z ascending (stable, so equal z keeps input order),
/// `target` is moved, and every item gets `z = index`. Returns false when
/// the target is missing or already at the requested extreme; z values are
/// still normalised in that case.
pub fn update_z_order<T: Stacked>(items: &mut Vec<T>, target: EntityId, op: ZOrderOp) -> bool {
    items.sort_by_key(|i| i.z_index());

    let moved = match items.iter().position(|i| i.stack_id() == target) {
        None => false,
        Some(pos) => {
            let last = items.len() - 1;
            match op {
                ZOrderOp::BringToFront if pos < last => {
                    let item = items.remove(pos);
                    items.push(item);
                    true
                }
                ZOrderOp::SendToBack if pos > 0 => {
                    let item = items.remove(pos);
                    items.insert(0, item);
                    true
                }
                ZOrderOp::BringForward if pos < last => {
                    items.swap(pos, pos + 1);
                    true
                }
                ZOrderOp::SendBackward if pos > 0 => {
                    items.swap(pos, pos - 1);
                    true
                }
                _ => false,
            }
        }
    };

    for (z, item) in items.iter_mut().enumerate() {
        item.set_z_index(i32::try_from(z).unwrap_or(i32::MAX));
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: EntityId,
        z: i32,
    }

    impl Stacked for Item {
        fn stack_id(&self) -> EntityId {
            self.id
        }
        fn z_index(&self) -> i32 {
            self.z
        }
        fn set_z_index(&mut self, z: i32) {
            self.z = z;
        }
    }

    fn stack(names: &[(&str, i32)]) -> Vec<Item> {
        names
            .iter()
            .map(|(n, z)| Item {
                id: EntityId::intern(n),
                z: *z,
            })
            .collect()
    }

    fn order(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn bring_to_front_moves_to_end() {
        let mut items = stack(&[("z_a", 0), ("z_b", 1), ("z_c", 2)]);
        assert!(update_z_order(&mut items, EntityId::intern("z_a"), ZOrderOp::BringToFront));
        assert_eq!(order(&items), vec!["z_b", "z_c", "z_a"]);
        assert_eq!(items.iter().map(|i| i.z).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn send_backward_swaps_with_previous() {
        let mut items = stack(&[("z_a", 0), ("z_b", 5), ("z_c", 9)]);
        assert!(update_z_order(&mut items, EntityId::intern("z_c"), ZOrderOp::SendBackward));
        assert_eq!(order(&items), vec!["z_a", "z_c", "z_b"]);
        assert_eq!(items[2].z, 2);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let mut items = stack(&[("z_c", 7), ("z_a", 1), ("z_b", 3)]);
        assert!(update_z_order(&mut items, EntityId::intern("z_b"), ZOrderOp::SendToBack));
        assert_eq!(order(&items), vec!["z_b", "z_a", "z_c"]);
    }

    #[test]
    fn extremes_are_noops_and_idempotent() {
        let mut items = stack(&[("z_a", 0), ("z_b", 1)]);
        assert!(!update_z_order(&mut items, EntityId::intern("z_b"), ZOrderOp::BringToFront));
        assert!(!update_z_order(&mut items, EntityId::intern("z_b"), ZOrderOp::BringForward));
        assert!(!update_z_order(&mut items, EntityId::intern("z_a"), ZOrderOp::SendToBack));
        let snapshot = items.clone();
        update_z_order(&mut items, EntityId::intern("z_b"), ZOrderOp::BringToFront);
        assert_eq!(items, snapshot);
    }

    #[test]
    fn missing_target_only_normalises() {
        let mut items = stack(&[("z_a", 10), ("z_b", 20)]);
        assert!(!update_z_order(&mut items, EntityId::intern("z_ghost"), ZOrderOp::BringToFront));
        assert_eq!(items.iter().map(|i| i.z).collect::<Vec<_>>(), vec![0, 1]);
    }
}
