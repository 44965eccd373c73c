//! Presentation snapshots of the registry for menus, the toolbar and the
//! command palette. Enablement is evaluated against the supplied context at
//! listing time and never cached.

use schemars::{schema_for, JsonSchema};
use serde::Serialize;
use serde_json::Value;

use super::CommandRegistry;
use crate::context::CommandContext;
use crate::descriptor::CommandDescriptor;
use crate::dispatcher::{effective_member, is_runnable};

/// One listed command with every label already resolved for its surface.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-export", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CommandListing {
    pub id: String,
    pub category: Option<String>,
    pub name: String,
    pub toolbar_label: String,
    pub menu_label: String,
    pub palette_label: String,
    pub icon: Option<String>,
    pub key_text: Option<String>,
    pub group: Option<String>,
    pub is_group_command: bool,
    pub toolbar: bool,
    pub toolbar_order: Option<i32>,
    pub is_related_to_tab: bool,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_commands: Vec<CommandListing>,
}

/// Menu section: one category and its commands.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-export", ts(export))]
pub struct MenuSection {
    pub category: String,
    pub commands: Vec<CommandListing>,
}

fn listing(registry: &CommandRegistry, desc: &CommandDescriptor, ctx: &CommandContext) -> CommandListing {
    let enabled = if desc.is_group_command {
        desc.group
            .as_deref()
            .is_some_and(|g| effective_member(registry, g, ctx).is_some())
    } else {
        is_runnable(desc, ctx)
    };
    let key_text = registry.display_key_text(desc);

    CommandListing {
        id: desc.id.clone(),
        category: desc.category.clone(),
        name: desc.name.clone(),
        toolbar_label: desc.toolbar_name.clone().unwrap_or_else(|| desc.name.clone()),
        menu_label: desc.menu_name.clone().unwrap_or_else(|| desc.name.clone()),
        palette_label: match &desc.category {
            Some(category) => format!("{category}: {}", desc.name),
            None => desc.name.clone(),
        },
        icon: desc.icon.clone(),
        key_text: (!key_text.is_empty()).then(|| key_text.raw().to_string()),
        group: desc.group.clone(),
        is_group_command: desc.is_group_command,
        toolbar: desc.toolbar,
        toolbar_order: desc.toolbar_order,
        is_related_to_tab: desc.is_related_to_tab,
        enabled,
        sub_commands: desc
            .sub_command_list(ctx)
            .iter()
            .map(|sub| listing(registry, sub, ctx))
            .collect(),
    }
}

/// Every command in registration order, anchors included.
pub fn all(registry: &CommandRegistry, ctx: &CommandContext) -> Vec<CommandListing> {
    registry
        .list()
        .iter()
        .map(|d| listing(registry, d, ctx))
        .collect()
}

/// Command palette: everything except group anchors.
pub fn palette(registry: &CommandRegistry, ctx: &CommandContext) -> Vec<CommandListing> {
    registry
        .list()
        .iter()
        .filter(|d| !d.is_group_command)
        .map(|d| listing(registry, d, ctx))
        .collect()
}

/// Toolbar-eligible commands by `toolbar_order`. Unordered commands go last;
/// ties keep registration order.
pub fn toolbar(registry: &CommandRegistry, ctx: &CommandContext) -> Vec<CommandListing> {
    let mut items: Vec<CommandListing> = registry
        .list()
        .iter()
        .filter(|d| d.toolbar && !d.is_group_command)
        .map(|d| listing(registry, d, ctx))
        .collect();
    items.sort_by_key(|l| (l.toolbar_order.is_none(), l.toolbar_order));
    items
}

/// Menu sections in first-seen category order. Anchors and uncategorised
/// commands are not menu items.
pub fn menu(registry: &CommandRegistry, ctx: &CommandContext) -> Vec<MenuSection> {
    let mut sections: indexmap::IndexMap<String, Vec<CommandListing>> = indexmap::IndexMap::new();
    for desc in registry.list() {
        if desc.is_group_command {
            continue;
        }
        let Some(category) = desc.category.clone() else {
            continue;
        };
        sections
            .entry(category)
            .or_default()
            .push(listing(registry, &desc, ctx));
    }
    sections
        .into_iter()
        .map(|(category, commands)| MenuSection { category, commands })
        .collect()
}

/// JSON schema of [`CommandListing`], for out-of-process UIs.
pub fn listing_schema() -> Value {
    let root = schema_for!(CommandListing);
    serde_json::to_value(root).unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}
