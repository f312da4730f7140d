//! FILENAME: rollup-engine/src/grouping.rs
//! PURPOSE: Expands constant and change dimension lists into grouping sets.

use crate::definition::DimensionList;

/// Builds the grouping sets to aggregate over.
///
/// Without change lists the constant lists are used as they are. Otherwise
/// every change list is appended to every constant list (constant columns
/// first), change-major, and the constant lists follow unmodified so the
/// "no extra breakdown" view is always present.
pub fn grouping_sets(
    constant: &[DimensionList],
    change: Option<&[DimensionList]>,
) -> Vec<DimensionList> {
    let Some(change) = change else {
        return constant.to_vec();
    };

    let mut sets = Vec::with_capacity(change.len() * constant.len() + constant.len());
    for change_list in change {
        for constant_list in constant {
            let mut set = constant_list.clone();
            set.extend(change_list.iter().cloned());
            sets.push(set);
        }
    }
    sets.extend(constant.iter().cloned());
    sets
}
