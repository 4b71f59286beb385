use pathdock_plugins::{PluginId, PythonpathManager, Workbench, WorkbenchError};
use pathdock_pythonpath::{keys, PathPrecedenceResolver, PrecedenceMap, StaticSystemPath, CONF_SECTION};
use pathdock_settings::{ConfigStore, MemoryConfigStore};
use pretty_assertions::assert_eq;

fn workbench(
    config: MemoryConfigStore,
    system: &[&str],
) -> Workbench<MemoryConfigStore, fn(&str) -> bool> {
    let probe: fn(&str) -> bool = |_| true;
    let system = StaticSystemPath(system.iter().map(|path| path.to_string()).collect());
    let manager = PythonpathManager::with_resolver(
        PathPrecedenceResolver::with_probe(config, probe),
        Box::new(system),
        None,
    );
    Workbench::new(manager)
}

fn strings(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|path| path.to_string()).collect()
}

#[test]
fn plugins_start_in_dependency_order() {
    let mut bench = workbench(MemoryConfigStore::new(), &["/env"]);
    assert_eq!(
        bench.startup_order().unwrap(),
        vec![
            PluginId::Preferences,
            PluginId::IPythonConsole,
            PluginId::PythonpathManager,
            PluginId::VariableExplorer,
        ]
    );

    bench.start().unwrap();
    assert!(bench.is_started(PluginId::VariableExplorer));
    assert!(bench.preferences().is_registered(PluginId::VariableExplorer));
    assert!(bench.variable_explorer().is_connected());
    assert_eq!(bench.console().search_path(), strings(&["/env"]).as_slice());
    assert_eq!(bench.plugin_name(PluginId::PythonpathManager), Some("PYTHONPATH manager"));
}

#[test]
fn project_changes_reach_console_shells() {
    let mut bench = workbench(MemoryConfigStore::new(), &["/env"]);
    bench.start().unwrap();
    let shell = bench.create_shell().unwrap();

    let change = bench.open_project("/proj").unwrap().expect("change");
    assert_eq!(change.added(), strings(&["/proj"]));
    assert_eq!(
        bench.console().shell(shell).unwrap().sys_path,
        strings(&["/proj", "/env"])
    );

    assert!(bench.open_project("/proj").unwrap().is_none());

    bench.close_project().unwrap();
    assert_eq!(bench.console().shell(shell).unwrap().sys_path, strings(&["/env"]));
}

#[test]
fn user_update_disables_path_everywhere() {
    let mut bench = workbench(MemoryConfigStore::new(), &["/env"]);
    bench.start().unwrap();
    let shell = bench.create_shell().unwrap();

    let update: PrecedenceMap = vec![("/extra", true), ("/env", false)].into_iter().collect();
    bench.update_pythonpath(&update).unwrap().expect("change");

    assert_eq!(bench.console().shell(shell).unwrap().sys_path, strings(&["/extra"]));
    let config = bench.pythonpath().resolver().config();
    assert_eq!(config.get_list(CONF_SECTION, keys::NOT_ACTIVE_PATH), strings(&["/env"]));
}

#[test]
fn variable_explorer_tracks_shells_and_external_kernels() {
    let mut config = MemoryConfigStore::new();
    config
        .set(PluginId::VariableExplorer.as_str(), "minmax", true.into())
        .unwrap();
    let mut bench = workbench(config, &[]);
    bench.start().unwrap();
    assert!(bench.variable_explorer().settings().show_minmax);

    let local = bench.create_shell().unwrap();
    let external = bench.connect_external_kernel().unwrap();
    assert_eq!(bench.variable_explorer().shells(), &[local, external]);
    assert_eq!(bench.variable_explorer().current_shell(), Some(external));

    let state = bench.console().shell(external).unwrap();
    assert_eq!(state.namespace_refreshes, 1);
    assert!(state.namespace_view.as_ref().unwrap().show_minmax);

    bench.set_current_shell(local).unwrap();
    assert_eq!(bench.variable_explorer().current_shell(), Some(local));

    bench.close_shell(local).unwrap();
    assert_eq!(bench.variable_explorer().shells(), &[external]);
}

#[test]
fn actions_require_a_started_workbench() {
    let mut bench = workbench(MemoryConfigStore::new(), &[]);
    assert!(matches!(
        bench.open_project("/proj"),
        Err(WorkbenchError::NotStarted(PluginId::PythonpathManager))
    ));
    assert!(matches!(
        bench.create_shell(),
        Err(WorkbenchError::NotStarted(PluginId::IPythonConsole))
    ));
}

#[test]
fn shutdown_saves_system_path_and_disconnects() {
    let mut bench = workbench(MemoryConfigStore::new(), &["/env"]);
    bench.start().unwrap();
    bench.shutdown().unwrap();

    assert!(!bench.is_started(PluginId::Preferences));
    assert!(!bench.variable_explorer().is_connected());
    let config = bench.pythonpath().resolver().config();
    assert_eq!(config.get_list(CONF_SECTION, keys::SYSTEM_PATH), strings(&["/env"]));
}
