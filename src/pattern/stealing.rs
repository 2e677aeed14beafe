//! Stealing methods of a halfling thief.
//!
//! [`StealingMethod::steal`] fixes the order of the steps; implementations
//! only fill them in.

use tracing::info;

/// What one theft produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heist {
    pub target: String,
    pub confusion: String,
    pub loot: String,
}

/// A way of stealing: pick a target, confuse it, take the item.
pub trait StealingMethod {
    fn pick_target(&self) -> String;

    fn confuse_target(&self, target: &str) -> String;

    fn steal_the_item(&self, target: &str) -> String;

    /// Run the steps in order. Not meant to be overridden.
    fn steal(&self) -> Heist {
        let target = self.pick_target();
        info!("The target has been chosen as {}.", target);

        let confusion = self.confuse_target(&target);
        info!("{}", confusion);

        let loot = self.steal_the_item(&target);
        info!("{}", loot);

        Heist {
            target,
            confusion,
            loot,
        }
    }
}

/// Grab and run.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitAndRunMethod;

impl StealingMethod for HitAndRunMethod {
    fn pick_target(&self) -> String {
        "old goblin woman".to_string()
    }

    fn confuse_target(&self, target: &str) -> String {
        format!("Approach the {} from behind.", target)
    }

    fn steal_the_item(&self, _target: &str) -> String {
        "Grab the handbag and run away fast!".to_string()
    }
}

/// Distract and pickpocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtleMethod;

impl StealingMethod for SubtleMethod {
    fn pick_target(&self) -> String {
        "shop keeper".to_string()
    }

    fn confuse_target(&self, target: &str) -> String {
        format!("Approach the {} with tears running and hug him!", target)
    }

    fn steal_the_item(&self, target: &str) -> String {
        format!("While in close contact grab the {}'s wallet.", target)
    }
}

/// Steals with whatever method it currently holds.
pub struct HalflingThief {
    method: Box<dyn StealingMethod>,
}

impl HalflingThief {
    pub fn new(method: Box<dyn StealingMethod>) -> Self {
        Self { method }
    }

    pub fn steal(&self) -> Heist {
        self.method.steal()
    }

    pub fn change_method(&mut self, method: Box<dyn StealingMethod>) {
        self.method = method;
    }
}

impl std::fmt::Debug for HalflingThief {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HalflingThief").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the order in which `steal` calls the steps.
    #[derive(Default)]
    struct Recording {
        calls: RefCell<Vec<String>>,
    }

    impl StealingMethod for Recording {
        fn pick_target(&self) -> String {
            self.calls.borrow_mut().push("pick".into());
            "troll".into()
        }

        fn confuse_target(&self, target: &str) -> String {
            self.calls.borrow_mut().push(format!("confuse {}", target));
            String::new()
        }

        fn steal_the_item(&self, target: &str) -> String {
            self.calls.borrow_mut().push(format!("steal {}", target));
            String::new()
        }
    }

    #[test]
    fn test_steps_run_in_order() {
        let method = Recording::default();
        method.steal();
        assert_eq!(
            *method.calls.borrow(),
            vec!["pick", "confuse troll", "steal troll"]
        );
    }

    #[test]
    fn test_hit_and_run() {
        let heist = HitAndRunMethod.steal();
        assert_eq!(heist.target, "old goblin woman");
        assert_eq!(heist.confusion, "Approach the old goblin woman from behind.");
        assert_eq!(heist.loot, "Grab the handbag and run away fast!");
    }

    #[test]
    fn test_thief_changes_method() {
        let mut thief = HalflingThief::new(Box::new(HitAndRunMethod));
        assert_eq!(thief.steal().target, "old goblin woman");

        thief.change_method(Box::new(SubtleMethod));
        let heist = thief.steal();
        assert_eq!(heist.target, "shop keeper");
        assert_eq!(heist.loot, "While in close contact grab the shop keeper's wallet.");
    }
}
