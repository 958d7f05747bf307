use std::path::Path;
use std::process::Command;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

/// Non-bare upstream on `main` with one commit containing index.html.
pub fn init_upstream(dir: &Path) -> Repository {
    std::fs::create_dir_all(dir).unwrap();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(dir, &opts).unwrap();
    commit_file(&repo, "index.html", "<h1>v1</h1>\n", "initial");
    repo
}

pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    std::fs::write(workdir.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("Test User", "test@example.com").unwrap();
    match repo.head() {
        Ok(head) => {
            let parent = repo.find_commit(head.target().unwrap()).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
                .unwrap()
        }
        Err(_) => repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
            .unwrap(),
    }
}

pub fn head(dir: &Path) -> String {
    let repo = Repository::open(dir).unwrap();
    repo.head().unwrap().target().unwrap().to_string()
}

pub fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}
