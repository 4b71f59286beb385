use thiserror::Error;

use crate::plugin::{Plugin, PluginId};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("plugin {0} registered twice")]
    Duplicate(PluginId),
    #[error("plugin {plugin} requires {dependency}, which is not registered")]
    MissingDependency {
        plugin: PluginId,
        dependency: PluginId,
    },
    #[error("dependency cycle between plugins: {}", format_ids(.0))]
    Cycle(Vec<PluginId>),
}

fn format_ids(ids: &[PluginId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 依相依關係排序外掛的啟動順序。 / Orders plugins so each starts after what it requires.
///
/// The order is stable: among the plugins whose requirements are met,
/// the one registered first starts first.
pub fn resolve_startup_order(plugins: &[&dyn Plugin]) -> Result<Vec<PluginId>, StartupError> {
    let mut registered: Vec<PluginId> = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        if registered.contains(&plugin.id()) {
            return Err(StartupError::Duplicate(plugin.id()));
        }
        registered.push(plugin.id());
    }

    for plugin in plugins {
        if let Some(missing) = plugin
            .requires()
            .iter()
            .find(|dependency| !registered.contains(dependency))
        {
            return Err(StartupError::MissingDependency {
                plugin: plugin.id(),
                dependency: *missing,
            });
        }
    }

    let mut order = Vec::with_capacity(plugins.len());
    let mut pending: Vec<&dyn Plugin> = plugins.to_vec();
    while !pending.is_empty() {
        let ready = pending.iter().position(|plugin| {
            plugin
                .requires()
                .iter()
                .all(|dependency| order.contains(dependency))
        });
        match ready {
            Some(index) => order.push(pending.remove(index).id()),
            None => {
                return Err(StartupError::Cycle(
                    pending.iter().map(|plugin| plugin.id()).collect(),
                ))
            }
        }
    }
    Ok(order)
}
