//! Given step definitions
//!
//! Steps that set up the order lines and splitter configuration.

use cucumber::{gherkin::Step, given};
use order_splitter::{Granularity, SplitMode};

use crate::helpers::value_conversion::{parse_table_to_pairs, parse_table_to_records, split_list};
use crate::world::SplitterWorld;

#[given("the following order lines:")]
fn set_order_lines(world: &mut SplitterWorld, step: &Step) {
    if let Some(table) = &step.table {
        world.records = parse_table_to_records(table);
    }
}

#[given("a granularity with conditions:")]
fn add_granularity(world: &mut SplitterWorld, step: &Step) {
    let table = step.table.as_ref().expect("Granularity step needs a table");
    let granularity = Granularity::from_mapping(parse_table_to_pairs(table))
        .unwrap_or_else(|e| panic!("Invalid granularity: {}", e));
    world.granularities.push(granularity);
}

#[given(expr = "a dimension on {string}")]
fn set_dimension(world: &mut SplitterWorld, fields: String) {
    world.dimension = split_list(&fields);
}

#[given(expr = "the split mode is {string}")]
fn set_split_mode(world: &mut SplitterWorld, mode: String) {
    world.split_mode = mode
        .parse::<SplitMode>()
        .unwrap_or_else(|e| panic!("Invalid split mode '{}': {}", mode, e));
}

#[given("the splitter configuration:")]
fn set_configuration(world: &mut SplitterWorld, step: &Step) {
    world.config = step.docstring.clone();
}
