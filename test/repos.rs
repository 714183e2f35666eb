// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::RepoFixture;

use toolbelt::repos::{fetch, run, scan, summarize, ReposOptions, RepoStatus};

use anyhow::Result;
use indicatif::ProgressBar;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{env::current_dir, fs::create_dir_all};

#[sealed_test]
fn scan_respects_depth() -> Result<()> {
    let root = current_dir()?;
    RepoFixture::new(root.join("alpha"))?;
    RepoFixture::new(root.join("group").join("beta"))?;
    RepoFixture::new(root.join("group").join("deep").join("gamma"))?;
    create_dir_all(root.join("plain").join("dir"))?;

    let found = scan(&root, 2)?;
    assert_eq!(found, vec![root.join("alpha"), root.join("group").join("beta")]);

    let found = scan(&root, 3)?;
    assert_eq!(found.len(), 3);

    Ok(())
}

#[sealed_test]
fn scan_root_itself() -> Result<()> {
    let root = current_dir()?;
    RepoFixture::new(&root)?;
    assert_eq!(scan(&root, 0)?, vec![root]);
    Ok(())
}

#[sealed_test]
fn summarize_unborn_branch() -> Result<()> {
    let root = current_dir()?.join("fresh");
    RepoFixture::new(&root)?;

    let status = summarize(&root)?;
    assert_eq!(
        status,
        RepoStatus {
            path: root,
            branch: "main".into(),
            ..Default::default()
        }
    );
    assert!(status.is_clean());

    Ok(())
}

#[sealed_test]
fn summarize_counts_changes() -> Result<()> {
    let root = current_dir()?.join("busy");
    let fixture = RepoFixture::new(&root)?;
    fixture.stage_and_commit("a.txt", "a")?;
    fixture.stage_and_commit("b.txt", "b")?;

    fixture.write("a.txt", "changed")?;
    fixture.write("c.txt", "c")?;
    fixture.write("d.txt", "d")?;
    fixture.stage("d.txt")?;

    let status = summarize(&root)?;
    assert_eq!(status.branch, "main");
    assert_eq!(status.upstream, None);
    assert_eq!(
        (status.staged, status.modified, status.untracked, status.conflicted),
        (1, 1, 1, 0)
    );
    assert!(!status.is_clean());

    Ok(())
}

#[sealed_test]
fn summarize_counts_stashes() -> Result<()> {
    let root = current_dir()?.join("stashed");
    let mut fixture = RepoFixture::new(&root)?;
    fixture.stage_and_commit("a.txt", "a")?;
    fixture.write("a.txt", "work in progress")?;
    fixture.stash()?;

    let status = summarize(&root)?;
    assert_eq!(status.stashes, 1);
    assert_eq!(status.modified, 0);
    assert!(status.is_clean());

    Ok(())
}

#[sealed_test]
fn summarize_detached_head() -> Result<()> {
    let root = current_dir()?.join("detached");
    let fixture = RepoFixture::new(&root)?;
    let first = fixture.stage_and_commit("a.txt", "a")?;
    fixture.stage_and_commit("b.txt", "b")?;
    fixture.detach(first)?;

    let status = summarize(&root)?;
    assert_eq!(status.branch, "(detached)");
    assert_eq!(status.upstream, None);

    Ok(())
}

#[sealed_test]
fn fetch_updates_ahead_behind() -> Result<()> {
    let root = current_dir()?;
    let origin = RepoFixture::new(root.join("origin"))?;
    origin.stage_and_commit("a.txt", "a")?;

    let local = RepoFixture::clone_of(origin.path(), root.join("local"))?;
    assert_eq!(summarize(local.path())?.upstream, Some((0, 0)));

    local.stage_and_commit("local.txt", "mine")?;
    origin.stage_and_commit("origin.txt", "theirs")?;
    assert_eq!(summarize(local.path())?.upstream, Some((1, 0)));

    fetch(local.path(), ProgressBar::hidden())?;
    let status = summarize(local.path())?;
    assert_eq!(status.upstream, Some((1, 1)));
    assert!(!status.is_clean());

    Ok(())
}

#[sealed_test]
fn fetch_without_upstream_is_noop() -> Result<()> {
    let root = current_dir()?.join("alone");
    let fixture = RepoFixture::new(&root)?;
    fixture.stage_and_commit("a.txt", "a")?;

    fetch(&root, ProgressBar::hidden())?;
    assert_eq!(summarize(&root)?.upstream, None);

    Ok(())
}

#[sealed_test]
fn run_filters_clean_repositories() -> Result<()> {
    let root = current_dir()?;
    let clean = RepoFixture::new(root.join("clean"))?;
    clean.stage_and_commit("a.txt", "a")?;
    let dirty = RepoFixture::new(root.join("dirty"))?;
    dirty.stage_and_commit("a.txt", "a")?;
    dirty.write("new.txt", "untracked")?;

    let opts = ReposOptions {
        root: root.clone(),
        depth: 1,
        fetch: false,
        dirty: false,
    };
    let all = run(&opts)?;
    assert_eq!(all.len(), 2);

    let opts = ReposOptions { dirty: true, ..opts };
    let dirty_only = run(&opts)?
        .into_iter()
        .map(|status| status.path)
        .collect::<Vec<_>>();
    assert_eq!(dirty_only, vec![root.join("dirty")]);

    Ok(())
}
