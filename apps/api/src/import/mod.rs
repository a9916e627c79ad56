// Prospect CSV import
// parse → auto-map → transform → duplicate check → batched insert → notify.
// All table access goes through `store::ProspectStore`.

pub mod batch;
pub mod csv_parser;
pub mod dedup;
pub mod events;
pub mod handlers;
pub mod mapper;
pub mod pipeline;
pub mod registry;
pub mod store;
pub mod transform;
