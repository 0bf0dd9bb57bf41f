use crate::error::AppError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Session states for the listen/classify/dispatch/speak cycle.
/// Exactly one is active at a time per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantState {
    Idle,
    ListeningForWake,
    ListeningForCommand,
    Processing,
    Speaking,
}

pub struct StateManager {
    state: Arc<RwLock<AssistantState>>,
    state_tx: Sender<AssistantState>,
    state_rx: Receiver<AssistantState>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(AssistantState::Idle)),
            state_tx,
            state_rx,
        }
    }

    pub fn transition(&self, new_state: AssistantState) -> Result<(), AppError> {
        let mut current = self.state.write();

        let valid = matches!(
            (&*current, &new_state),
            (AssistantState::Idle, AssistantState::ListeningForWake)
                | (AssistantState::Idle, AssistantState::ListeningForCommand)
                | (AssistantState::ListeningForWake, AssistantState::ListeningForCommand)
                | (AssistantState::ListeningForCommand, AssistantState::Processing)
                | (AssistantState::ListeningForCommand, AssistantState::ListeningForWake)
                | (AssistantState::Processing, AssistantState::Speaking)
                | (AssistantState::Speaking, AssistantState::ListeningForWake)
                | (_, AssistantState::Idle)
        );

        if !valid {
            return Err(AppError::Fatal(format!(
                "Invalid state transition: {:?} -> {:?}",
                *current, new_state
            )));
        }

        tracing::debug!("State transition: {:?} -> {:?}", *current, new_state);
        *current = new_state;
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    /// Cancellation path: any state may fall back to Idle.
    pub fn force_idle(&self) {
        let mut current = self.state.write();
        if *current != AssistantState::Idle {
            tracing::debug!("State forced: {:?} -> Idle", *current);
            *current = AssistantState::Idle;
            let _ = self.state_tx.send(AssistantState::Idle);
        }
    }

    pub fn current(&self) -> AssistantState {
        *self.state.read()
    }

    pub fn subscribe(&self) -> Receiver<AssistantState> {
        self.state_rx.clone()
    }
}
