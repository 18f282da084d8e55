use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "flv", "rmvb", "mov", "m4v", "webm", "wmv", "ts", "m2ts", "mpg", "mpeg",
    "ogm",
];

/// 按扩展名判断是否为视频文件（不区分大小写）
pub fn is_video(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// 取路径的父目录，单独的文件名归到 "."
pub fn parent_dir(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

pub struct FileScanner {
    recursive: bool,
}

impl FileScanner {
    pub fn new(recursive: bool) -> Self {
        Self { recursive }
    }

    /// 收集目录下的所有文件（包括非视频文件），按路径排序
    pub fn scan(&self, path: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        if self.recursive {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if let Ok(entries) = std::fs::read_dir(path) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();

        files
    }

    /// 展开命令行参数：目录替换为其中的文件，文件原样保留
    pub fn collect(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for input in inputs {
            if input.is_dir() {
                files.extend(self.scan(input));
            } else {
                files.push(input.clone());
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_video() {
        assert!(is_video("Show - 01.mkv"));
        assert!(is_video("dir/Show - 01.MP4"));
        assert!(!is_video("Show - 01.ass"));
        assert!(!is_video("notes"));
        assert!(!is_video(".mkv"));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("Show/Season 1/01.mkv"), "Show/Season 1");
        assert_eq!(parent_dir("01.mkv"), ".");
    }

    #[test]
    fn test_scan_keeps_non_video_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mkv"), "").unwrap();
        fs::write(dir.path().join("a.ass"), "").unwrap();
        fs::create_dir(dir.path().join("extras")).unwrap();
        fs::write(dir.path().join("extras").join("c.mkv"), "").unwrap();

        let flat = FileScanner::new(false).scan(dir.path());
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.ass", "b.mkv"]);

        let recursive = FileScanner::new(true).scan(dir.path());
        assert_eq!(recursive.len(), 3);
        assert!(recursive.ends_with(&[dir.path().join("extras").join("c.mkv")]));
    }

    #[test]
    fn test_collect_mixes_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("01.mkv"), "").unwrap();
        fs::write(dir.path().join("02.mkv"), "").unwrap();
        let loose = PathBuf::from("loose.mkv");

        let scanner = FileScanner::new(false);
        let files = scanner.collect(&[loose.clone(), dir.path().to_path_buf()]);
        assert_eq!(
            files,
            vec![loose, dir.path().join("01.mkv"), dir.path().join("02.mkv")]
        );
    }
}
