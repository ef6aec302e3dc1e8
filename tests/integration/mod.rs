//! Integration Tests Module
//!
//! End-to-end tests of the orchestrator runtime against a scripted in-memory
//! analysis service. Time is paused in every test, so poll ticks and
//! countdowns run instantly while keeping their virtual durations.


// Tab listing, hydration and stale re-runs
mod listing_test;


// Delete, rename and duplicate
mod tab_actions_test;
