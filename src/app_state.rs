use crate::notifier::Notifier;
use crate::store::TaskStore;

#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub notifier: Notifier,
}
