use crate::probe::FsProbe;

/// 啟動載入時使用的既存與目前資料。 / Persisted and observed inputs of a startup load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadInputs {
    pub persisted_paths: Vec<String>,
    pub persisted_not_active: Vec<String>,
    pub system_path_now: Vec<String>,
    pub system_path_previous: Vec<String>,
}

/// 啟動載入的結果。 / Result of [`load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedPaths {
    /// Persisted paths that survived the filters, in their original order.
    pub retained: Vec<String>,
    /// `retained` followed by the current system path.
    pub user_paths: Vec<String>,
    /// Inactive paths that still exist.
    pub not_active: Vec<String>,
}

/// Filters persisted paths against the filesystem and the system path.
///
/// A persisted path is dropped when it is no longer a directory, or when
/// it was part of the previous system path but is missing from the
/// current one. Nothing here fails: vanished paths are simply skipped.
pub fn load<P>(probe: &P, inputs: &LoadInputs) -> LoadedPaths
where
    P: FsProbe + ?Sized,
{
    let retained: Vec<String> = inputs
        .persisted_paths
        .iter()
        .filter(|path| probe.is_directory(path))
        .filter(|path| {
            !(inputs.system_path_previous.contains(path) && !inputs.system_path_now.contains(path))
        })
        .cloned()
        .collect();

    let mut user_paths = retained.clone();
    user_paths.extend(inputs.system_path_now.iter().cloned());

    let not_active = inputs
        .persisted_not_active
        .iter()
        .filter(|path| probe.is_directory(path))
        .cloned()
        .collect();

    LoadedPaths {
        retained,
        user_paths,
        not_active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn probe(path: &str) -> bool {
        path != "/gone"
    }

    #[test]
    fn drops_missing_directories_and_paths_removed_from_environment() {
        let inputs = LoadInputs {
            persisted_paths: strings(&["/a", "/gone", "/env-old", "/env-kept"]),
            persisted_not_active: strings(&["/a", "/gone"]),
            system_path_now: strings(&["/env-kept", "/env-new"]),
            system_path_previous: strings(&["/env-old", "/env-kept"]),
        };

        let loaded = load(&probe, &inputs);
        assert_eq!(loaded.retained, strings(&["/a", "/env-kept"]));
        assert_eq!(
            loaded.user_paths,
            strings(&["/a", "/env-kept", "/env-kept", "/env-new"])
        );
        assert_eq!(loaded.not_active, strings(&["/a"]));
    }

    #[test]
    fn repeated_loads_are_identical() {
        let inputs = LoadInputs {
            persisted_paths: strings(&["/a", "/b"]),
            persisted_not_active: strings(&["/b"]),
            system_path_now: strings(&["/sys"]),
            system_path_previous: Vec::new(),
        };
        assert_eq!(load(&probe, &inputs), load(&probe, &inputs));
    }

    #[test]
    fn empty_inputs_load_empty_state() {
        assert_eq!(load(&probe, &LoadInputs::default()), LoadedPaths::default());
    }
}
