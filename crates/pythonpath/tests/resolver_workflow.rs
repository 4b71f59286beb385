use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pathdock_pythonpath::{
    keys, PathChange, PathManagerModel, PathPrecedenceResolver, PrecedenceMap, StaticSystemPath,
    CONF_SECTION, LEGACY_NOT_ACTIVE_FILE, LEGACY_PATH_FILE,
};
use pathdock_settings::{ConfigError, ConfigStore, ConfigValue, JsonConfigStore, MemoryConfigStore};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn dir(root: &Path, name: &str) -> String {
    let path = root.join(name);
    fs::create_dir_all(&path).expect("create dir");
    path.to_string_lossy().into_owned()
}

fn recorder<C: ConfigStore>(
    resolver: &mut PathPrecedenceResolver<C>,
) -> Rc<RefCell<Vec<PathChange>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    resolver.subscribe(move |change| sink.borrow_mut().push(change.clone()));
    seen
}

/// Memory store that records every `set` and can refuse one option.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryConfigStore,
    writes: Vec<String>,
    refuse: Rc<Cell<Option<&'static str>>>,
}

impl ConfigStore for RecordingStore {
    fn get(&self, section: &str, key: &str) -> Option<ConfigValue> {
        self.inner.get(section, key)
    }

    fn set(&mut self, section: &str, key: &str, value: ConfigValue) -> Result<(), ConfigError> {
        self.writes.push(key.to_string());
        if self.refuse.get() == Some(key) {
            return Err(ConfigError::Write {
                path: PathBuf::from("recording"),
                source: io::Error::new(io::ErrorKind::Other, "write refused"),
            });
        }
        self.inner.set(section, key, value)
    }
}

type RecordingResolver = PathPrecedenceResolver<RecordingStore, fn(&str) -> bool>;

/// Resolver over a [`RecordingStore`], plus the handle that makes it refuse an option.
fn recording_resolver(paths: &[&str]) -> (RecordingResolver, Rc<Cell<Option<&'static str>>>) {
    let mut store = RecordingStore::default();
    let refuse = Rc::clone(&store.refuse);
    store
        .set(
            CONF_SECTION,
            keys::PATH,
            paths.iter().map(|path| path.to_string()).collect::<Vec<_>>().into(),
        )
        .unwrap();
    let probe: fn(&str) -> bool = |_| true;
    let mut resolver = PathPrecedenceResolver::with_probe(store, probe);
    resolver
        .setup(&StaticSystemPath::default(), None)
        .expect("setup");
    (resolver, refuse)
}

fn count_changes<C: ConfigStore>(
    resolver: &mut PathPrecedenceResolver<C, fn(&str) -> bool>,
) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    resolver.subscribe(move |_| *sink.borrow_mut() += 1);
    count
}

#[test]
fn setup_drops_vanished_paths_and_persists_filtered_state() {
    let temp = tempdir().expect("tempdir");
    let kept = dir(temp.path(), "kept");
    let env_old = dir(temp.path(), "env-old");
    let env_now = dir(temp.path(), "env-now");
    let deleted = temp.path().join("deleted").to_string_lossy().into_owned();

    let mut config = MemoryConfigStore::new();
    config
        .set(
            CONF_SECTION,
            keys::PATH,
            vec![kept.clone(), deleted.clone(), env_old.clone()].into(),
        )
        .unwrap();
    config
        .set(
            CONF_SECTION,
            keys::NOT_ACTIVE_PATH,
            vec![kept.clone(), deleted.clone()].into(),
        )
        .unwrap();
    config
        .set(CONF_SECTION, keys::SYSTEM_PATH, vec![env_old.clone()].into())
        .unwrap();
    config
        .set(CONF_SECTION, keys::PATHS_IN_CONF_FILES, false.into())
        .unwrap();

    let system = StaticSystemPath(vec![env_now.clone()]);
    let mut resolver = PathPrecedenceResolver::new(config);
    resolver.setup(&system, None).expect("setup");

    assert_eq!(resolver.user_paths(), &[kept.clone(), env_now.clone()]);
    assert_eq!(resolver.not_active_paths(), &[kept.clone()]);
    assert_eq!(resolver.active_paths(), vec![env_now.clone()]);

    let config = resolver.config();
    assert_eq!(config.get_list(CONF_SECTION, keys::PATH), vec![kept.clone()]);
    assert_eq!(config.get_list(CONF_SECTION, keys::SYSTEM_PATH), vec![env_now.clone()]);
    assert_eq!(config.get_list(CONF_SECTION, keys::NOT_ACTIVE_PATH), vec![kept]);
    assert_eq!(
        config.get_list(CONF_SECTION, keys::SPYDER_PYTHONPATH),
        vec![env_now]
    );
}

#[test]
fn apply_update_notifies_only_on_effective_change() {
    let temp = tempdir().expect("tempdir");
    let a = dir(temp.path(), "a");
    let b = dir(temp.path(), "b");

    let mut config = MemoryConfigStore::new();
    config
        .set(CONF_SECTION, keys::PATH, vec![a.clone(), b.clone()].into())
        .unwrap();
    config
        .set(CONF_SECTION, keys::PATHS_IN_CONF_FILES, false.into())
        .unwrap();
    let mut resolver = PathPrecedenceResolver::new(config);
    resolver
        .setup(&StaticSystemPath::default(), None)
        .expect("setup");
    let seen = recorder(&mut resolver);

    let update: PrecedenceMap = vec![(a.clone(), true), (b.clone(), false)]
        .into_iter()
        .collect();
    let change = resolver.apply_update(&update).unwrap().expect("b deactivated");
    assert_eq!(change.old.get(&b), Some(true));
    assert_eq!(change.new.get(&b), Some(false));

    assert!(resolver.apply_update(&update).unwrap().is_none());
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(
        resolver.config().get_list(CONF_SECTION, keys::NOT_ACTIVE_PATH),
        vec![b]
    );
    assert_eq!(
        resolver.config().get_list(CONF_SECTION, keys::SPYDER_PYTHONPATH),
        vec![a]
    );
}

#[test]
fn same_project_path_twice_emits_once() {
    let mut resolver = PathPrecedenceResolver::new(MemoryConfigStore::new());
    resolver
        .setup(&StaticSystemPath::default(), None)
        .expect("setup");
    let seen = recorder(&mut resolver);

    resolver.set_project_paths(vec!["/proj".into()]).unwrap();
    resolver.set_project_paths(vec!["/proj".into()]).unwrap();

    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(resolver.active_paths(), vec!["/proj".to_string()]);
}

#[test]
fn legacy_files_migrate_into_json_store() {
    let temp = tempdir().expect("tempdir");
    let legacy = temp.path().join("legacy");
    fs::create_dir_all(&legacy).unwrap();
    fs::write(legacy.join(LEGACY_PATH_FILE), "/a\n/b\n").unwrap();
    fs::write(legacy.join(LEGACY_NOT_ACTIVE_FILE), "/b\n").unwrap();
    let config_path = temp.path().join("config.json");

    let store = JsonConfigStore::load(&config_path).unwrap();
    let mut resolver = PathPrecedenceResolver::with_probe(store, |_: &str| true);
    resolver
        .setup(&StaticSystemPath::default(), Some(legacy.as_path()))
        .expect("setup");

    let reloaded = JsonConfigStore::load(&config_path).unwrap();
    assert_eq!(reloaded.get_list(CONF_SECTION, keys::PATH), vec!["/a", "/b"]);
    assert_eq!(
        reloaded.get_list(CONF_SECTION, keys::NOT_ACTIVE_PATH),
        vec!["/b"]
    );
    assert!(!reloaded.get_bool(CONF_SECTION, keys::PATHS_IN_CONF_FILES, true));
    assert_eq!(resolver.active_paths(), vec!["/a".to_string()]);
}

#[test]
fn path_manager_round_trip_through_resolver() {
    let temp = tempdir().expect("tempdir");
    let a = dir(temp.path(), "a");
    let b = dir(temp.path(), "b");
    let sys = dir(temp.path(), "sys");

    let mut config = MemoryConfigStore::new();
    config
        .set(CONF_SECTION, keys::PATH, vec![a.clone()].into())
        .unwrap();
    config
        .set(CONF_SECTION, keys::PATHS_IN_CONF_FILES, false.into())
        .unwrap();
    let system = StaticSystemPath(vec![sys.clone()]);
    let mut resolver = PathPrecedenceResolver::new(config);
    resolver.setup(&system, None).expect("setup");
    resolver.update_active_project_path(Some("/proj")).unwrap();

    let mut model = PathManagerModel::for_resolver(&resolver, &system.0);
    assert!(model.accept().is_none());
    model.add_path(&b, false);
    let update = model.accept().expect("b added");

    let change = resolver.apply_update(&update).unwrap().expect("change");
    assert_eq!(change.added(), vec![b.clone()]);
    assert_eq!(
        resolver.active_paths(),
        vec!["/proj".to_string(), b, a, sys]
    );
}

#[test]
fn no_op_mutations_do_not_touch_the_store() {
    let (mut resolver, _) = recording_resolver(&["/a", "/b"]);
    let writes_after_setup = resolver.config().writes.len();

    let same: PrecedenceMap = vec![("/a", true), ("/b", true)].into_iter().collect();
    assert!(resolver.apply_update(&same).unwrap().is_none());
    assert!(resolver.set_project_paths(Vec::new()).unwrap().is_none());
    assert_eq!(resolver.config().writes.len(), writes_after_setup);

    resolver.set_project_paths(vec!["/proj".into()]).unwrap();
    let writes_after_open = resolver.config().writes.len();
    assert_eq!(
        &resolver.config().writes[writes_after_setup..],
        [keys::SPYDER_PYTHONPATH.to_string()]
    );
    assert!(resolver
        .set_project_paths(vec!["/proj".into()])
        .unwrap()
        .is_none());
    assert_eq!(resolver.config().writes.len(), writes_after_open);
}

#[test]
fn activation_change_writes_only_affected_options() {
    let (mut resolver, _) = recording_resolver(&["/a", "/b"]);
    let before = resolver.config().writes.len();

    let update: PrecedenceMap = vec![("/a", true), ("/b", false)].into_iter().collect();
    resolver.apply_update(&update).unwrap().expect("b deactivated");

    assert_eq!(
        &resolver.config().writes[before..],
        [
            keys::NOT_ACTIVE_PATH.to_string(),
            keys::SPYDER_PYTHONPATH.to_string(),
        ]
    );
}

#[test]
fn failed_update_leaves_state_and_listeners_untouched() {
    let (mut resolver, refuse) = recording_resolver(&["/a", "/b"]);
    let changes = count_changes(&mut resolver);
    let before = resolver.precedence_map();
    refuse.set(Some(keys::NOT_ACTIVE_PATH));

    let update: PrecedenceMap = vec![("/b", true), ("/a", false)].into_iter().collect();
    assert!(resolver.apply_update(&update).is_err());

    assert_eq!(resolver.precedence_map(), before);
    assert_eq!(resolver.user_paths(), ["/a".to_string(), "/b".to_string()]);
    assert_eq!(*changes.borrow(), 0);
    assert_eq!(
        resolver.config().get_list(CONF_SECTION, keys::SPYDER_PYTHONPATH),
        vec!["/a", "/b"]
    );

    refuse.set(None);
    let change = resolver.apply_update(&update).unwrap().expect("retry applies");
    assert_eq!(change.old, before);
    assert_eq!(*changes.borrow(), 1);
    assert_eq!(resolver.active_paths(), vec!["/b".to_string()]);
}
