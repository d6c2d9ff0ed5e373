//! Then step definitions
//!
//! Steps that verify split outputs, lookups and errors.

use cucumber::then;

use crate::helpers::value_conversion::{record_ids, split_list};
use crate::world::SplitterWorld;

#[then(expr = "there are {int} outputs")]
fn assert_output_count(world: &mut SplitterWorld, expected: usize) {
    assert!(
        world.error.is_none(),
        "Expected successful split, got error: {:?}",
        world.error_message()
    );
    assert_eq!(
        world.outputs.len(),
        expected,
        "Unexpected outputs: {:#?}",
        world.outputs
    );
}

#[then(expr = "output {int} holds order lines {string}")]
fn assert_output_records(world: &mut SplitterWorld, position: usize, ids: String) {
    let output = world.output(position);
    assert_eq!(
        record_ids(&output.records),
        split_list(&ids),
        "Output {} ({}) holds unexpected order lines",
        position,
        output.stage
    );
}

#[then(expr = "output {int} is empty")]
fn assert_output_empty(world: &mut SplitterWorld, position: usize) {
    let output = world.output(position);
    assert!(
        output.records.is_empty(),
        "Expected output {} to be empty, got {:?}",
        position,
        record_ids(&output.records)
    );
}

#[then(expr = "output {int} belongs to group {string}")]
fn assert_output_group(world: &mut SplitterWorld, position: usize, key: String) {
    assert_eq!(world.output(position).key, key);
}

#[then(expr = "output {int} comes from the catch-all stage")]
fn assert_output_catch_all(world: &mut SplitterWorld, position: usize) {
    let output = world.output(position);
    assert!(output.catch_all, "Output {} came from {}", position, output.stage);
    assert_eq!(output.stage, "True");
}

#[then(expr = "output {int} comes from the stage {string}")]
fn assert_output_stage(world: &mut SplitterWorld, position: usize, rendered: String) {
    assert_eq!(world.output(position).stage, rendered);
}

#[then("every order line appears in exactly one output")]
fn assert_exactly_once(world: &mut SplitterWorld) {
    let mut seen: Vec<String> = world
        .outputs
        .iter()
        .flat_map(|o| record_ids(&o.records))
        .collect();
    let mut expected = record_ids(&world.records);
    seen.sort();
    expected.sort();
    assert_eq!(seen, expected);
}

#[then(expr = "the matching granularity is {string}")]
fn assert_lookup(world: &mut SplitterWorld, rendered: String) {
    assert_eq!(world.lookup, Some(Some(rendered)));
}

#[then("no granularity matches")]
fn assert_no_lookup(world: &mut SplitterWorld) {
    assert_eq!(world.lookup, Some(None));
}

#[then(expr = "the error mentions {string}")]
fn assert_error(world: &mut SplitterWorld, fragment: String) {
    let message = world
        .error_message()
        .unwrap_or_else(|| panic!("Expected an error mentioning '{}'", fragment));
    assert!(
        message.contains(&fragment),
        "Expected error containing '{}', got '{}'",
        fragment,
        message
    );
}

#[then("the error is a configuration error")]
fn assert_configuration_error(world: &mut SplitterWorld) {
    let error = world.error.as_ref().expect("Expected an error");
    assert!(error.is_configuration_error(), "Got {}", error);
}
