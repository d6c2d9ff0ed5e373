//! When step definitions
//!
//! Steps that run the splitter.

use cucumber::when;
use order_splitter::Condition;

use crate::world::SplitterWorld;

#[when("the order lines are split")]
fn split_order_lines(world: &mut SplitterWorld) {
    world.split();
}

#[when(expr = "order line {int} is looked up")]
fn look_up_order_line(world: &mut SplitterWorld, position: usize) {
    world.look_up(position - 1);
}

#[when(expr = "a condition is built for field {string} with expression {string}")]
fn build_condition(world: &mut SplitterWorld, field: String, expression: String) {
    match Condition::new(field, expression) {
        Ok(_) => world.error = None,
        Err(e) => world.error = Some(e),
    }
}
