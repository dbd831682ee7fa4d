//! Category aggregation

use dashgen_core::{ApplicationCategory, CategoryDescriptor, ExampleRecord};

/// Count examples per catalog category, preserving catalog order.
///
/// Labels are compared exactly: case-sensitive, no normalization. Examples
/// whose label is not in the catalog are not counted anywhere.
pub fn aggregate_categories(
    examples: &[ExampleRecord],
    catalog: &[CategoryDescriptor],
) -> Vec<ApplicationCategory> {
    catalog
        .iter()
        .map(|category| ApplicationCategory {
            app_type: category.app_type.clone(),
            rank: category.mm_rank.clone(),
            no_examples: examples
                .iter()
                .filter(|example| example.app_type == category.app_type)
                .count(),
        })
        .collect()
}
