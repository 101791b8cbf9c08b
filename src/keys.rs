//! Global key bindings held for the lifetime of their owner.
//!
//! [`KeyBindings::bind`] installs one action per key name and returns a
//! [`KeyBinding`] guard; dropping the guard removes the binding. Binding a key
//! that is already bound replaces the action, and the replaced guard's drop
//! leaves the newer binding in place.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKey {
  Enter,
  Escape,
}

impl BoundKey {
  pub fn from_event(key: &KeyEvent) -> Option<Self> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
      return None;
    }
    match key.code {
      KeyCode::Enter => Some(BoundKey::Enter),
      KeyCode::Esc => Some(BoundKey::Escape),
      _ => None,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      BoundKey::Enter => "Enter",
      BoundKey::Escape => "Escape",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
  FocusSearch,
  CloseDetail,
}

type Registry = RefCell<HashMap<BoundKey, (u64, KeyAction)>>;

#[derive(Default)]
pub struct KeyBindings {
  registry: Rc<Registry>,
  next_generation: RefCell<u64>,
}

impl KeyBindings {
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use = "the binding is removed as soon as the guard is dropped"]
  pub fn bind(&self, key: BoundKey, action: KeyAction) -> KeyBinding {
    let generation = {
      let mut next = self.next_generation.borrow_mut();
      *next += 1;
      *next
    };
    if let Some((_, previous)) = self.registry.borrow_mut().insert(key, (generation, action)) {
      debug!(key = key.name(), ?previous, ?action, "keys: binding replaced");
    }
    KeyBinding { registry: Rc::downgrade(&self.registry), key, generation }
  }

  pub fn lookup(&self, key: &KeyEvent) -> Option<KeyAction> {
    let bound = BoundKey::from_event(key)?;
    self.registry.borrow().get(&bound).map(|(_, action)| *action)
  }

  pub fn is_bound(&self, key: BoundKey) -> bool {
    self.registry.borrow().contains_key(&key)
  }
}

/// Keeps a binding installed until dropped.
pub struct KeyBinding {
  registry: Weak<Registry>,
  key: BoundKey,
  generation: u64,
}

impl Drop for KeyBinding {
  fn drop(&mut self) {
    let Some(registry) = self.registry.upgrade() else { return };
    let mut map = registry.borrow_mut();
    if map.get(&self.key).is_some_and(|(generation, _)| *generation == self.generation) {
      map.remove(&self.key);
    }
  }
}
