//! Persistence gateway for world files.
//!
//! The store talks to disk only through [`WorldGateway`]. [`YamlGateway`] is the file
//! implementation: one YAML document per object, laid out as
//!
//! ```text
//! <docs_dir>/*.yml                     help entries
//! <data_dir>/areas/*.yml               areas (rooms + resets)
//! <data_dir>/items/**/*.yml            item templates
//! <data_dir>/mobs/**/*.yml             mob templates
//! <data_dir>/planets/*.yml             star systems
//! <data_dir>/ships/prototypes/*.yml    ship prototypes (any path containing "prototype")
//! <data_dir>/ships/*.yml               live ships
//! <data_dir>/accounts/<c>/<name>.yml   players, partitioned by lower-cased first letter
//! ```
//!
//! Writes go to a temp file that replaces the target under an exclusive `fs2` lock.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::world::entity::{CharData, PlayerProfile};
use crate::world::errors::WorldError;
use crate::world::types::{AreaData, HelpData, ItemData, ShipData, StarSystemData};

/// Characters kept verbatim in generated file names.
const FILE_STEM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Ship files split by role.
#[derive(Debug, Default)]
pub struct ShipFiles {
    pub prototypes: Vec<ShipData>,
    pub live: Vec<ShipData>,
}

pub trait WorldGateway: Send + Sync {
    fn load_helps(&self) -> Result<Vec<HelpData>, WorldError>;
    fn load_areas(&self) -> Result<Vec<AreaData>, WorldError>;
    fn load_items(&self) -> Result<Vec<ItemData>, WorldError>;
    fn load_starsystems(&self) -> Result<Vec<StarSystemData>, WorldError>;
    fn load_mobs(&self) -> Result<Vec<CharData>, WorldError>;
    fn load_ships(&self) -> Result<ShipFiles, WorldError>;

    fn save_area(&self, area: &AreaData) -> Result<(), WorldError>;
    fn save_item(&self, item: &ItemData) -> Result<(), WorldError>;
    fn save_mob(&self, mob: &CharData) -> Result<(), WorldError>;
    fn save_ship_prototype(&self, ship: &ShipData) -> Result<(), WorldError>;
    fn save_ship(&self, ship: &ShipData) -> Result<(), WorldError>;
    fn save_player(&self, player: &PlayerProfile) -> Result<(), WorldError>;

    /// Off-line player record. `Ok(None)` when no file exists for the name.
    fn read_player(&self, name: &str) -> Result<Option<PlayerProfile>, WorldError>;
}

#[derive(Debug, Clone)]
pub struct YamlGateway {
    data_dir: PathBuf,
    docs_dir: PathBuf,
}

impl YamlGateway {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_dir: P, docs_dir: Q) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            docs_dir: docs_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create the directory skeleton a fresh world needs.
    pub fn init_layout(&self) -> Result<(), WorldError> {
        for sub in [
            "areas",
            "items",
            "mobs",
            "planets",
            "ships/prototypes",
            "accounts",
        ] {
            fs::create_dir_all(self.data_dir.join(sub))?;
        }
        fs::create_dir_all(&self.docs_dir)?;
        Ok(())
    }

    pub fn player_path(&self, name: &str) -> Option<PathBuf> {
        let lower = name.trim().to_lowercase();
        let first = lower.chars().next()?;
        Some(
            self.data_dir
                .join("accounts")
                .join(file_stem(&first.to_string()))
                .join(format!("{}.yml", file_stem(&lower))),
        )
    }

    fn load_dir<T: DeserializeOwned>(&self, dir: &Path, recursive: bool) -> Result<Vec<(PathBuf, T)>, WorldError> {
        let files = yaml_files(dir, recursive)?;
        let mut out = Vec::with_capacity(files.len());
        for path in files {
            let value = read_yaml(&path)?;
            out.push((path, value));
        }
        Ok(out)
    }
}

impl WorldGateway for YamlGateway {
    fn load_helps(&self) -> Result<Vec<HelpData>, WorldError> {
        let helps: Vec<(PathBuf, HelpData)> = self.load_dir(&self.docs_dir, false)?;
        Ok(helps.into_iter().map(|(_, h)| h).collect())
    }

    fn load_areas(&self) -> Result<Vec<AreaData>, WorldError> {
        let areas: Vec<(PathBuf, AreaData)> = self.load_dir(&self.data_dir.join("areas"), false)?;
        Ok(areas.into_iter().map(|(_, a)| a).collect())
    }

    fn load_items(&self) -> Result<Vec<ItemData>, WorldError> {
        let items: Vec<(PathBuf, ItemData)> = self.load_dir(&self.data_dir.join("items"), true)?;
        Ok(items
            .into_iter()
            .map(|(path, mut item)| {
                item.source = Some(path);
                item
            })
            .collect())
    }

    fn load_starsystems(&self) -> Result<Vec<StarSystemData>, WorldError> {
        let systems: Vec<(PathBuf, StarSystemData)> =
            self.load_dir(&self.data_dir.join("planets"), false)?;
        Ok(systems.into_iter().map(|(_, s)| s).collect())
    }

    fn load_mobs(&self) -> Result<Vec<CharData>, WorldError> {
        let mobs: Vec<(PathBuf, CharData)> = self.load_dir(&self.data_dir.join("mobs"), true)?;
        Ok(mobs
            .into_iter()
            .map(|(path, mut mob)| {
                mob.source = Some(path);
                mob
            })
            .collect())
    }

    fn load_ships(&self) -> Result<ShipFiles, WorldError> {
        let ships: Vec<(PathBuf, ShipData)> = self.load_dir(&self.data_dir.join("ships"), true)?;
        let mut files = ShipFiles::default();
        for (path, mut ship) in ships {
            let is_prototype = path.to_string_lossy().contains("prototype");
            ship.source = Some(path);
            if is_prototype {
                files.prototypes.push(ship);
            } else {
                files.live.push(ship);
            }
        }
        Ok(files)
    }

    fn save_area(&self, area: &AreaData) -> Result<(), WorldError> {
        let path = self
            .data_dir
            .join("areas")
            .join(format!("{}.yml", file_stem(&underscored(&area.name))));
        write_yaml(&path, area)
    }

    fn save_item(&self, item: &ItemData) -> Result<(), WorldError> {
        let path = item.source.clone().unwrap_or_else(|| {
            self.data_dir.join("items").join(format!("{}.yml", item.id))
        });
        write_yaml(&path, item)
    }

    fn save_mob(&self, mob: &CharData) -> Result<(), WorldError> {
        let path = mob
            .source
            .clone()
            .unwrap_or_else(|| self.data_dir.join("mobs").join(format!("{}.yml", mob.id)));
        write_yaml(&path, mob)
    }

    fn save_ship_prototype(&self, ship: &ShipData) -> Result<(), WorldError> {
        let path = self
            .data_dir
            .join("ships")
            .join("prototypes")
            .join(format!("{}.yml", file_stem(&underscored(&ship.ship_type))));
        write_yaml(&path, ship)
    }

    fn save_ship(&self, ship: &ShipData) -> Result<(), WorldError> {
        let path = self
            .data_dir
            .join("ships")
            .join(format!("{}.yml", file_stem(&underscored(&ship.name))));
        write_yaml(&path, ship)
    }

    fn save_player(&self, player: &PlayerProfile) -> Result<(), WorldError> {
        let path = self
            .player_path(&player.ch.name)
            .ok_or_else(|| WorldError::NotFound("player with an empty name".to_string()))?;
        write_yaml(&path, player)
    }

    fn read_player(&self, name: &str) -> Result<Option<PlayerProfile>, WorldError> {
        let Some(path) = self.player_path(name) else {
            return Ok(None);
        };
        if !path.exists() {
            debug!("no player file at {}", path.display());
            return Ok(None);
        }
        read_yaml(&path).map(Some)
    }
}

fn underscored(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn file_stem(name: &str) -> String {
    utf8_percent_encode(name, FILE_STEM).to_string()
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// YAML files under `dir`, sorted by path. A missing directory yields nothing.
fn yaml_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, WorldError> {
    if !dir.exists() {
        warn!("world directory {} does not exist; nothing to load", dir.display());
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if is_yaml(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, WorldError> {
    let text = fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|e| WorldError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), WorldError> {
    let text = serde_yaml::to_string(value)?;
    write_file_locked(path, &text)
}

/// Replace `path` with `content` through a temp file while holding an exclusive lock on
/// a `.<name>.lock` sidecar. The destination is only touched by the final rename.
fn write_file_locked(path: &Path, content: &str) -> Result<(), WorldError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("world.yml");
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(dir.join(format!(".{}.lock", base)))?;
    lock_file.lock_exclusive()?;

    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                let written = tmp.write_all(content.as_bytes()).and_then(|_| tmp.flush());
                if let Err(e) = written {
                    let _ = fs::remove_file(&candidate);
                    return Err(e.into());
                }
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e.into()),
        }
    };

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    drop(lock_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn player_paths_partition_by_first_letter() {
        let gw = YamlGateway::new("/srv/world", "/srv/docs");
        assert_eq!(
            gw.player_path("Kira").unwrap(),
            PathBuf::from("/srv/world/accounts/k/kira.yml")
        );
        assert!(gw.player_path("  ").is_none());
        let odd = gw.player_path("../etc").unwrap();
        assert!(!odd.to_string_lossy().contains(".."));
    }

    #[test]
    fn missing_directories_load_empty() {
        let tmp = TempDir::new().unwrap();
        let gw = YamlGateway::new(tmp.path().join("data"), tmp.path().join("docs"));
        assert!(gw.load_areas().unwrap().is_empty());
        assert!(gw.load_helps().unwrap().is_empty());
        let ships = gw.load_ships().unwrap();
        assert!(ships.prototypes.is_empty() && ships.live.is_empty());
    }

    #[test]
    fn malformed_file_is_reported_with_path() {
        let tmp = TempDir::new().unwrap();
        let gw = YamlGateway::new(tmp.path(), tmp.path().join("docs"));
        gw.init_layout().unwrap();
        fs::write(tmp.path().join("items/broken.yml"), "id: [not a number").unwrap();
        match gw.load_items() {
            Err(WorldError::Malformed { path, .. }) => assert!(path.ends_with("broken.yml")),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("areas/cantina.yml");
        // A non-empty directory where the file should go makes the final rename fail.
        fs::create_dir_all(target.join("occupied")).unwrap();

        assert!(write_file_locked(&target, "name: Cantina\n").is_err());
        assert!(target.is_dir());
        let leftovers: Vec<String> = fs::read_dir(tmp.path().join("areas"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
    }

    #[test]
    fn lock_sidecar_is_not_loaded_as_world_data() {
        let tmp = TempDir::new().unwrap();
        let gw = YamlGateway::new(tmp.path(), tmp.path().join("docs"));
        gw.save_area(&AreaData::new("Mos Eisley")).unwrap();

        assert!(tmp.path().join("areas/.mos_eisley.yml.lock").exists());
        let areas = gw.load_areas().unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].name, "Mos Eisley");
    }

    #[test]
    fn item_saves_back_to_its_source() {
        let tmp = TempDir::new().unwrap();
        let gw = YamlGateway::new(tmp.path(), tmp.path().join("docs"));
        gw.init_layout().unwrap();
        fs::create_dir_all(tmp.path().join("items/weapons")).unwrap();
        fs::write(
            tmp.path().join("items/weapons/blaster.yml"),
            "id: 3\nname: a blaster pistol\ndmg: 2d4\n",
        )
        .unwrap();

        let mut items = gw.load_items().unwrap();
        assert_eq!(items.len(), 1);
        items[0].value = 250;
        gw.save_item(&items[0]).unwrap();

        let again = gw.load_items().unwrap();
        assert_eq!(again[0].value, 250);
        assert!(again[0]
            .source
            .as_ref()
            .unwrap()
            .ends_with("weapons/blaster.yml"));
    }
}
