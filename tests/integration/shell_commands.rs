//! Shell session flows, including snapshot files written to disk

use canopy::config::SnapshotSettings;
use canopy::shell::{Outcome, Shell};
use canopy::snapshot::{parse_full, parse_incremental, SnapshotMerger, SnapshotWriter};
use tempfile::TempDir;

fn shell(dir: &TempDir) -> Shell {
    Shell::new(&SnapshotSettings {
        dir: dir.path().to_path_buf(),
        pretty: true,
    })
}

fn run(sh: &mut Shell, line: &str) -> String {
    match sh.execute(line).unwrap() {
        Outcome::Output(text) => text,
        other => panic!("unexpected outcome for {:?}: {:?}", line, other),
    }
}

#[test]
fn test_editing_session() {
    let tmp = TempDir::new().unwrap();
    let mut sh = shell(&tmp);

    run(&mut sh, "mkdir /proj/src");
    run(&mut sh, "write /proj/src/main.rs fn main() {}");
    run(&mut sh, "append /proj/src/main.rs // end");
    assert_eq!(run(&mut sh, "cat /proj/src/main.rs"), "fn main() {}// end");

    run(&mut sh, "cd /proj");
    assert_eq!(run(&mut sh, "pwd"), "/proj");
    run(&mut sh, "touch notes.txt");
    assert_eq!(run(&mut sh, "ls"), "src/\nnotes.txt");

    run(&mut sh, "mv notes.txt src/notes.txt");
    assert_eq!(run(&mut sh, "ls src"), "main.rs\nnotes.txt");
}

#[test]
fn test_copy_directory_requires_recursive_flag() {
    let tmp = TempDir::new().unwrap();
    let mut sh = shell(&tmp);

    run(&mut sh, "mkdir /a");
    run(&mut sh, "write /a/f.txt data");
    assert!(sh.execute("cp /a /b").is_err());

    run(&mut sh, "cp -r /a /b");
    assert_eq!(run(&mut sh, "cat /b/f.txt"), "data");
    // The original is untouched.
    assert_eq!(run(&mut sh, "cat /a/f.txt"), "data");
}

#[test]
fn test_snapshot_files_merge_back_to_live_state() {
    let tmp = TempDir::new().unwrap();
    let mut sh = shell(&tmp);

    run(&mut sh, "mkdir /a/b");
    run(&mut sh, "write /a/b/c.txt hello");
    run(&mut sh, "snapshot full");

    run(&mut sh, "rm /a/b/c.txt");
    run(&mut sh, "write /a/b/d.txt world");
    run(&mut sh, "snapshot inc");

    let full_text = std::fs::read_to_string(tmp.path().join("full-0001.json")).unwrap();
    let inc_text = std::fs::read_to_string(tmp.path().join("inc-0002.json")).unwrap();

    let full = parse_full(&full_text).unwrap();
    let inc = parse_incremental(&inc_text).unwrap();

    let mut merged = SnapshotMerger::load_full(&full).unwrap();
    SnapshotMerger::apply(&mut merged, &inc).unwrap();

    assert!(merged.resolve("/a/b/c.txt").is_err());
    let id = merged.resolve("/a/b/d.txt").unwrap();
    assert_eq!(merged.node(id).unwrap().data(), Some("world"));

    let live = SnapshotWriter::full(&mut sh.namespace().clone());
    let reconstructed = SnapshotWriter::full(&mut merged);
    assert_eq!(live, reconstructed);
}

#[test]
fn test_failed_removal_leaves_tree_unchanged() {
    let tmp = TempDir::new().unwrap();
    let mut sh = shell(&tmp);

    run(&mut sh, "mkdir /a/b");
    assert!(sh.execute("rm /a").is_err());
    assert_eq!(run(&mut sh, "ls /a"), "b/");
}
