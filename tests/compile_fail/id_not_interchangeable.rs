// ABOUTME: Compile-fail test verifying CommitId and ServiceId are not interchangeable.
// ABOUTME: This test should fail to compile, validating type safety.

use liftoff::types::{CommitId, ServiceId};

fn takes_service_id(_id: ServiceId) {}

fn main() {
    let commit = CommitId::new("abc123");
    takes_service_id(commit); // ERROR: expected ServiceId, found CommitId
}
