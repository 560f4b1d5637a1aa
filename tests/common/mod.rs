#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// A small hitter batch the way the collector hands it over: Korean header
/// labels plus the stamped year column.
pub fn sample_hitters_csv() -> String {
    [
        "선수명,팀명,AVG,G,PA,AB,R,H,2B,3B,HR,TB,RBI,SAC,SF,year",
        "김도영,KIA,0.347,141,625,544,143,189,29,10,38,352,109,0,5,2024",
        "문보경,LG,0.301,144,611,532,88,160,30,2,22,240,101,1,8,2024",
        "빅또르,키움,-,3,5,5,0,0,0,0,0,0,0,0,0,2024",
    ]
    .join("\n")
}

pub fn sample_pitchers_csv() -> String {
    [
        "선수명,팀명,ERA,IP,W,L,SV,SO,BB,H,HR,year",
        "원태인,삼성,3.66,159 2/3,15,6,0,119,42,160,19,2024",
        "하트,NC,2.69,157,13,3,0,182,38,124,10,2024",
    ]
    .join("\n")
}

pub fn sample_rankings_csv() -> String {
    [
        "순위,팀,경기,승,패,무,승률,게임차,연속,최근10경기,홈,방문,year",
        "1,KIA,144,87,55,2,0.613,-,2승,6승4패,46-24-1,41-31-1,2024",
        "2,삼성,144,78,64,2,0.549,9.0,1패,5승5패,42-28-1,36-36-1,2024",
    ]
    .join("\n")
}
