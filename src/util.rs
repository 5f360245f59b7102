use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Создаёт каталог (рекурсивно), если его нет, и возвращает канонический путь
pub fn mkdir(dir: impl AsRef<Path>) -> AppResult<PathBuf> {
    let dir = dir.as_ref();

    // корень и переходы по каталогам не допускаются
    if dir.as_os_str().is_empty() || [Path::new("/"), Path::new("."), Path::new("..")].contains(&dir)
    {
        return Err(AppError::Config("invalid directory".to_string()));
    }

    if dir.exists() && !dir.is_dir() {
        return Err(AppError::Config(format!(
            "cannot create directory: {} already exists as a file",
            dir.display()
        )));
    }

    fs::create_dir_all(dir)?;

    Ok(dir.canonicalize()?)
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> AppResult<T> {
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

pub fn save_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, data: &T) -> AppResult<()> {
    let json = serde_json::to_vec_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}
