use candid::Principal;
use std::cell::RefCell;
use std::collections::BTreeSet;

thread_local! {
    static ACTIVE_SESSIONS: RefCell<BTreeSet<Principal>> = RefCell::new(BTreeSet::new());
}

/// Serializes update commands per player.
///
/// A command that awaits (seed initialization) could otherwise interleave with
/// a second command against the same GameState. Released on drop.
pub struct SessionGuard {
    player: Principal,
}

impl SessionGuard {
    pub fn new(player: Principal) -> Result<Self, String> {
        ACTIVE_SESSIONS.with(|active| {
            let mut active = active.borrow_mut();
            if !active.insert(player) {
                return Err("Operation already in progress for this caller".to_string());
            }
            Ok(Self { player })
        })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        ACTIVE_SESSIONS.with(|active| {
            active.borrow_mut().remove(&self.player);
        });
    }
}
