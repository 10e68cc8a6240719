//! Host capabilities a script can call into.
//!
//! Scripts reach game systems (inventories, currency, quests) only through
//! [`StoryHost`]. Every method has a neutral default, so a host implements
//! just the capabilities it has.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::schema::value::Value;

/// The conversation a story is currently serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueContext {
    pub npc_name: String,
    pub npc_id: Option<String>,
}

/// Name reported by `NpcName` when no dialogue context is set.
pub const UNKNOWN_NPC_NAME: &str = "Unknown NPC";

/// Game-side capabilities exposed to scripts.
#[allow(unused_variables)]
pub trait StoryHost {
    fn display_name(&self, id: &str) -> Option<String> {
        None
    }

    fn count_item(&self, holder: &str, item: &str) -> i64 {
        0
    }

    fn can_add_item(&self, holder: &str, item: &str, quantity: i64) -> bool {
        false
    }

    fn add_item(&mut self, holder: &str, item: &str, quantity: i64) -> bool {
        false
    }

    fn remove_item(&mut self, holder: &str, item: &str, quantity: i64) -> bool {
        false
    }

    fn currency(&self, holder: &str) -> i64 {
        0
    }

    fn add_currency(&mut self, holder: &str, amount: i64) {}

    fn remove_currency(&mut self, holder: &str, amount: i64) -> bool {
        false
    }

    fn quest_status(&self, quest: &str) -> String {
        "Unknown".to_string()
    }

    fn set_quest_status(&mut self, quest: &str, status: &str) -> bool {
        false
    }

    fn task_status(&self, quest: &str, task: &str) -> String {
        "Unknown".to_string()
    }

    fn set_task_status(&mut self, quest: &str, task: &str, status: &str) -> bool {
        false
    }
}

/// A host with no capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl StoryHost for NoHost {}

/// Shared, single-threaded handle to a host.
pub type SharedHost = Rc<RefCell<dyn StoryHost>>;

/// A typed host call as written in a script.
///
/// String arguments may contain `{var}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostCall {
    NpcName,
    /// The current NPC's id; empty when there is none.
    NpcId,
    Name { id: String },
    CountItem { holder: String, item: String },
    CanAddItem { holder: String, item: String, quantity: i64 },
    AddItem { holder: String, item: String, quantity: i64 },
    RemoveItem { holder: String, item: String, quantity: i64 },
    Currency { holder: String },
    AddCurrency { holder: String, amount: i64 },
    RemoveCurrency { holder: String, amount: i64 },
    QuestStatus { quest: String },
    SetQuestStatus { quest: String, status: String },
    TaskStatus { quest: String, task: String },
    SetTaskStatus { quest: String, task: String, status: String },
}

impl HostCall {
    /// Run the call against `host`. `resolve` expands placeholders in
    /// string arguments.
    pub fn invoke<F>(
        &self,
        host: &mut dyn StoryHost,
        context: Option<&DialogueContext>,
        resolve: F,
    ) -> Option<Value>
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::NpcName => Some(Value::String(
                context
                    .map(|c| c.npc_name.clone())
                    .unwrap_or_else(|| UNKNOWN_NPC_NAME.to_string()),
            )),
            Self::NpcId => Some(Value::String(
                context
                    .and_then(|c| c.npc_id.clone())
                    .unwrap_or_default(),
            )),
            Self::Name { id } => {
                let id = resolve(id);
                Some(Value::String(host.display_name(&id).unwrap_or(id)))
            }
            Self::CountItem { holder, item } => {
                Some(Value::Int(host.count_item(&resolve(holder), &resolve(item))))
            }
            Self::CanAddItem {
                holder,
                item,
                quantity,
            } => Some(Value::Bool(host.can_add_item(
                &resolve(holder),
                &resolve(item),
                *quantity,
            ))),
            Self::AddItem {
                holder,
                item,
                quantity,
            } => Some(Value::Bool(host.add_item(
                &resolve(holder),
                &resolve(item),
                *quantity,
            ))),
            Self::RemoveItem {
                holder,
                item,
                quantity,
            } => Some(Value::Bool(host.remove_item(
                &resolve(holder),
                &resolve(item),
                *quantity,
            ))),
            Self::Currency { holder } => Some(Value::Int(host.currency(&resolve(holder)))),
            Self::AddCurrency { holder, amount } => {
                host.add_currency(&resolve(holder), *amount);
                None
            }
            Self::RemoveCurrency { holder, amount } => Some(Value::Bool(
                host.remove_currency(&resolve(holder), *amount),
            )),
            Self::QuestStatus { quest } => {
                Some(Value::String(host.quest_status(&resolve(quest))))
            }
            Self::SetQuestStatus { quest, status } => Some(Value::Bool(
                host.set_quest_status(&resolve(quest), &resolve(status)),
            )),
            Self::TaskStatus { quest, task } => Some(Value::String(
                host.task_status(&resolve(quest), &resolve(task)),
            )),
            Self::SetTaskStatus {
                quest,
                task,
                status,
            } => Some(Value::Bool(host.set_task_status(
                &resolve(quest),
                &resolve(task),
                &resolve(status),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[derive(Default)]
    struct Purse {
        coins: FxHashMap<String, i64>,
    }

    impl StoryHost for Purse {
        fn currency(&self, holder: &str) -> i64 {
            self.coins.get(holder).copied().unwrap_or(0)
        }

        fn add_currency(&mut self, holder: &str, amount: i64) {
            *self.coins.entry(holder.to_string()).or_insert(0) += amount;
        }
    }

    fn identity(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn npc_name_uses_context() {
        let ctx = DialogueContext {
            npc_name: "Mira".to_string(),
            npc_id: None,
        };
        let mut host = NoHost;
        assert_eq!(
            HostCall::NpcName.invoke(&mut host, Some(&ctx), identity),
            Some(Value::from("Mira"))
        );
        assert_eq!(
            HostCall::NpcName.invoke(&mut host, None, identity),
            Some(Value::from(UNKNOWN_NPC_NAME))
        );
    }

    #[test]
    fn npc_id_uses_context() {
        let mut host = NoHost;
        let ctx = DialogueContext {
            npc_name: "Mira".to_string(),
            npc_id: Some("npc-mira".to_string()),
        };
        assert_eq!(
            HostCall::NpcId.invoke(&mut host, Some(&ctx), identity),
            Some(Value::from("npc-mira"))
        );
        let anonymous = DialogueContext {
            npc_id: None,
            ..ctx
        };
        assert_eq!(
            HostCall::NpcId.invoke(&mut host, Some(&anonymous), identity),
            Some(Value::from(""))
        );
        assert_eq!(
            HostCall::NpcId.invoke(&mut host, None, identity),
            Some(Value::from(""))
        );
    }

    #[test]
    fn no_host_defaults() {
        let mut host = NoHost;
        let call = HostCall::CountItem {
            holder: "player".to_string(),
            item: "apple".to_string(),
        };
        assert_eq!(call.invoke(&mut host, None, identity), Some(Value::Int(0)));
        let name = HostCall::Name {
            id: "guid-1".to_string(),
        };
        assert_eq!(
            name.invoke(&mut host, None, identity),
            Some(Value::from("guid-1"))
        );
    }

    #[test]
    fn currency_round_trip_through_host() {
        let mut purse = Purse::default();
        let add = HostCall::AddCurrency {
            holder: "{who}".to_string(),
            amount: 5,
        };
        let resolve = |s: &str| s.replace("{who}", "player");
        assert_eq!(add.invoke(&mut purse, None, resolve), None);
        let get = HostCall::Currency {
            holder: "player".to_string(),
        };
        assert_eq!(get.invoke(&mut purse, None, identity), Some(Value::Int(5)));
    }
}
