//! Reading a Lex Talionis project's `game_data` into typed records.

pub mod components;
pub mod keys;
pub mod records;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ErrorKind, IResult};
use components::ComponentError;
use keys::*;
use records::*;

/// Somewhere `game_data` files can be read from.
pub trait ResourceSource {
    fn read(&self, file: &str) -> IResult<Cow<'static, [u8]>>;

    /// Human readable location of `file`, used in error messages.
    fn describe(&self, file: &str) -> String {
        file.to_string()
    }
}

/// A source backed by a closure. Mostly useful for in-memory projects.
pub struct DataFileWithCallback<F> {
    callback: F,
}

impl<F> DataFileWithCallback<F>
where
    F: Fn(&str) -> IResult<Cow<'static, [u8]>>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ResourceSource for DataFileWithCallback<F>
where
    F: Fn(&str) -> IResult<Cow<'static, [u8]>>,
{
    fn read(&self, file: &str) -> IResult<Cow<'static, [u8]>> {
        (self.callback)(file)
    }
}

/// A project on disk. Accepts either the project root or its `game_data`
/// directory.
#[derive(Debug, Clone)]
pub struct ProjectDir {
    root: PathBuf,
    game_data: PathBuf,
}

impl ProjectDir {
    pub fn open(path: &Path) -> IResult<Self> {
        if !path.is_dir() {
            return Err(ErrorKind::load(
                path.display().to_string(),
                "not a directory",
            ));
        }

        let nested = path.join(GAME_DATA_DIR);
        let project = if nested.is_dir() {
            ProjectDir {
                root: path.to_path_buf(),
                game_data: nested,
            }
        } else {
            let root = if path.file_name().is_some_and(|name| name == GAME_DATA_DIR) {
                path.parent().unwrap_or(path).to_path_buf()
            } else {
                path.to_path_buf()
            };
            ProjectDir {
                root,
                game_data: path.to_path_buf(),
            }
        };
        debug!(game_data = %project.game_data.display(), "opened project");
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn game_data(&self) -> &Path {
        &self.game_data
    }
}

impl ResourceSource for ProjectDir {
    fn read(&self, file: &str) -> IResult<Cow<'static, [u8]>> {
        let path = self.game_data.join(file);
        std::fs::read(&path)
            .map(Cow::Owned)
            .map_err(|e| ErrorKind::load(self.describe(file), e))
    }

    fn describe(&self, file: &str) -> String {
        self.game_data.join(file).display().to_string()
    }
}

/// Category assignments as stored in `*.category.json`: record nid to a
/// `/`-separated category path.
pub type CategoryMap = BTreeMap<String, String>;

/// Everything the extraction pipeline reads, validated but not yet linked.
#[derive(Debug, Clone, Default)]
pub struct RawResources {
    pub skills: Vec<SkillRecord>,
    pub items: Vec<ItemRecord>,
    pub classes: Vec<ClassRecord>,
    pub units: Vec<UnitRecord>,
    pub events: Vec<EventRecord>,
    pub skill_categories: CategoryMap,
    pub item_categories: CategoryMap,
    pub unit_categories: CategoryMap,
}

fn parse<T: DeserializeOwned>(source: &dyn ResourceSource, file: &str) -> IResult<T> {
    let data = source.read(file)?;
    serde_json::from_slice(&data).map_err(|e| ErrorKind::load(source.describe(file), e))
}

/// Parses `file` as a list of raw records and validates each one.
fn parse_records<R, T>(source: &dyn ResourceSource, file: &str) -> IResult<Vec<T>>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = ComponentError>,
{
    let raw: Vec<R> = parse(source, file)?;
    raw.into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            T::try_from(raw).map_err(|e| {
                ErrorKind::load(source.describe(file), format!("record #{idx}: {e}"))
            })
        })
        .collect()
}

/// Records addressed by their `nid`.
pub trait HasNid {
    fn nid(&self) -> &str;
}

macro_rules! has_nid {
    ($($ty:ty),*) => {
        $(impl HasNid for $ty {
            fn nid(&self) -> &str {
                &self.nid
            }
        })*
    };
}

has_nid!(SkillRecord, ItemRecord, ClassRecord, UnitRecord, EventRecord);

pub fn load_resources(source: &dyn ResourceSource) -> IResult<RawResources> {
    let skills = parse_records::<RawSkill, SkillRecord>(source, SKILLS_FILE)?;
    let items = parse_records::<RawItem, ItemRecord>(source, ITEMS_FILE)?;
    let classes = parse_records::<RawClass, ClassRecord>(source, CLASSES_FILE)?;
    let units: Vec<RawUnit> = parse(source, UNITS_FILE)?;
    let units: Vec<UnitRecord> = units.into_iter().map(UnitRecord::from).collect();
    let events: Vec<EventRecord> = parse(source, EVENTS_FILE)?;

    let resources = RawResources {
        skills,
        items,
        classes,
        units,
        events,
        skill_categories: parse(source, SKILL_CATEGORIES_FILE)?,
        item_categories: parse(source, ITEM_CATEGORIES_FILE)?,
        unit_categories: parse(source, UNIT_CATEGORIES_FILE)?,
    };

    for (file, nids) in [
        (SKILLS_FILE, resources.skills.iter().map(HasNid::nid).collect::<Vec<_>>()),
        (ITEMS_FILE, resources.items.iter().map(HasNid::nid).collect()),
        (CLASSES_FILE, resources.classes.iter().map(HasNid::nid).collect()),
        (UNITS_FILE, resources.units.iter().map(HasNid::nid).collect()),
        (EVENTS_FILE, resources.events.iter().map(HasNid::nid).collect()),
    ] {
        if let Some(position) = nids.iter().position(|nid| nid.trim().is_empty()) {
            return Err(ErrorKind::load(
                source.describe(file),
                format!("record #{position} has an empty nid"),
            ));
        }
        debug!(file, records = nids.len(), "loaded");
    }

    Ok(resources)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::collections::HashMap;

    /// Builds an in-memory source from `(file, json)` pairs. Category files
    /// default to `{}` so tests only spell out what they need.
    pub(crate) fn memory_source(
        files: &[(&str, &str)],
    ) -> DataFileWithCallback<impl Fn(&str) -> IResult<Cow<'static, [u8]>>> {
        let mut map: HashMap<String, Vec<u8>> = HashMap::new();
        for file in [SKILL_CATEGORIES_FILE, ITEM_CATEGORIES_FILE, UNIT_CATEGORIES_FILE] {
            map.insert(file.to_string(), b"{}".to_vec());
        }
        for file in [SKILLS_FILE, ITEMS_FILE, CLASSES_FILE, UNITS_FILE, EVENTS_FILE] {
            map.insert(file.to_string(), b"[]".to_vec());
        }
        for (file, json) in files {
            map.insert(file.to_string(), json.as_bytes().to_vec());
        }
        DataFileWithCallback::new(move |file: &str| {
            map.get(file)
                .map(|data| Cow::Owned(data.clone()))
                .ok_or_else(|| ErrorKind::load(file, "no such file"))
        })
    }

    #[test]
    fn loads_minimal_project() {
        let source = memory_source(&[
            (SKILLS_FILE, r#"[{"nid": "Canto", "name": "Canto", "components": []}]"#),
            (SKILL_CATEGORIES_FILE, r#"{"Canto": "Movement"}"#),
        ]);
        let resources = load_resources(&source).unwrap();
        assert_eq!(resources.skills.len(), 1);
        assert_eq!(resources.skills[0].name, "Canto");
        assert_eq!(resources.skill_categories["Canto"], "Movement");
    }

    #[test]
    fn missing_file_names_the_file() {
        let source = DataFileWithCallback::new(|file: &str| {
            if file == ITEMS_FILE {
                Err(ErrorKind::load(file, "no such file"))
            } else if file.ends_with(".category.json") {
                Ok(Cow::Borrowed(&b"{}"[..]))
            } else {
                Ok(Cow::Borrowed(&b"[]"[..]))
            }
        });
        match load_resources(&source) {
            Err(ErrorKind::Load { file, .. }) => assert_eq!(file, ITEMS_FILE),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_component_fails_load() {
        let source = memory_source(&[(
            ITEMS_FILE,
            r#"[{"nid": "Iron_Sword", "components": [["weapon_type", 4]]}]"#,
        )]);
        match load_resources(&source) {
            Err(ErrorKind::Load { file, reason }) => {
                assert_eq!(file, ITEMS_FILE);
                assert!(reason.contains("weapon_type"), "{reason}");
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn empty_nid_is_rejected() {
        let source = memory_source(&[(UNITS_FILE, r#"[{"nid": " "}]"#)]);
        assert!(matches!(load_resources(&source), Err(ErrorKind::Load { .. })));
    }

    #[test]
    fn project_dir_finds_nested_game_data() {
        let dir = tempfile::tempdir().unwrap();
        let game_data = dir.path().join(GAME_DATA_DIR);
        std::fs::create_dir(&game_data).unwrap();
        std::fs::write(game_data.join(SKILLS_FILE), "[]").unwrap();

        let project = ProjectDir::open(dir.path()).unwrap();
        assert_eq!(project.game_data(), game_data.as_path());
        assert_eq!(project.root(), dir.path());
        assert_eq!(&*project.read(SKILLS_FILE).unwrap(), b"[]");

        let direct = ProjectDir::open(&game_data).unwrap();
        assert_eq!(direct.root(), dir.path());

        match project.read(ITEMS_FILE) {
            Err(ErrorKind::Load { file, .. }) => assert!(file.ends_with(ITEMS_FILE)),
            other => panic!("expected load error, got {other:?}"),
        }
    }
}
