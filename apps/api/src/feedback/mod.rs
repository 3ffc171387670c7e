// Feedback on stored provocations: index-addressed votes on the collection,
// and the reviewer score file used while curating generated batches.

pub mod handlers;
pub mod voting;
