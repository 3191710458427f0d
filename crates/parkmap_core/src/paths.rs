use cap_std::{
    ambient_authority,
    fs_utf8::camino::{Utf8Path, Utf8PathBuf},
    fs_utf8::Dir,
};
use miette::{Context, IntoDiagnostic, Result};

/// Parkmap data directory
/// We will read a path from env `PARKMAP_DATA_DIR` or use data_local_dir/parkmap, where data_local_dir is platform specific
/// Inside this directory, we store the configuration file and the logs.
pub const DATA_DIR_ENV: &str = "PARKMAP_DATA_DIR";
pub const LOGS_DIR_NAME: &str = "logs";

/// Where the data directory lives, for display and for the log appender which wants a path.
pub fn get_parkmap_path() -> Result<std::path::PathBuf> {
    if let Ok(env_dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(std::path::PathBuf::from(env_dir));
    }
    if let Some(project_dir) = directories_next::ProjectDirs::from("com.parkmap", "", "parkmap") {
        Ok(project_dir.data_local_dir().to_path_buf())
    } else {
        Err(miette::miette!("getting project path failed for some reason"))
    }
}

/// Opens the data directory, creating it when missing.
pub fn get_parkmap_dir() -> Result<Dir> {
    let authority = ambient_authority();
    let dir = if let Ok(env_dir) = std::env::var(DATA_DIR_ENV) {
        let path = Utf8PathBuf::from(&env_dir);
        Dir::create_ambient_dir_all(&path, authority)
            .into_diagnostic()
            .wrap_err(path.clone())
            .wrap_err("failed to create parkmap directory")?;
        Dir::open_ambient_dir(&path, authority)
            .into_diagnostic()
            .wrap_err(path)
            .wrap_err("failed to open parkmap data dir")?
    } else {
        let project_dir = cap_directories::ProjectDirs::from("com.parkmap", "", "parkmap", authority)
            .ok_or(miette::miette!("getting project dirs failed for some reason"))?;
        let dir = project_dir
            .data_local_dir()
            .into_diagnostic()
            .wrap_err("failed to get data local dir using capstd")?;
        Dir::from_cap_std(dir)
    };
    Ok(dir)
}

/// Opens the directory holding `path` and returns it with the file name inside it.
/// A bare file name resolves against the current directory.
pub fn open_parent_dir(path: &Utf8Path) -> Result<(Dir, &str)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| miette::miette!("{path} does not name a file"))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .into_diagnostic()
        .wrap_err(parent.to_owned())
        .wrap_err("failed to open directory")?;
    Ok((dir, file_name))
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch(name: &str) -> Utf8PathBuf {
        let path = std::env::temp_dir().join(format!("parkmap-paths-{name}-{}", std::process::id()));
        Utf8PathBuf::from_path_buf(path).unwrap()
    }

    #[test]
    fn test_open_parent_dir_reads_through_the_dir() {
        let root = scratch("parent");
        Dir::create_ambient_dir_all(&root, ambient_authority()).unwrap();
        let root_dir = Dir::open_ambient_dir(&root, ambient_authority()).unwrap();
        root_dir.write("lots.json", "[]").unwrap();

        let lots_path = root.join("lots.json");
        let (dir, file_name) = open_parent_dir(&lots_path).unwrap();
        assert_eq!(file_name, "lots.json");
        assert_eq!(dir.read_to_string(file_name).unwrap(), "[]");

        root_dir.remove_file("lots.json").unwrap();
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let (dir, file_name) = open_parent_dir(Utf8Path::new("Cargo.toml")).unwrap();
        assert_eq!(file_name, "Cargo.toml");
        // tests run from the crate root
        assert!(dir.is_file(file_name));
    }

    #[test]
    fn test_path_without_file_name() {
        assert!(open_parent_dir(Utf8Path::new("/")).is_err());
        assert!(open_parent_dir(&scratch("missing").join("nested").join("x.json")).is_err());
    }
}
