// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod repos;

use anyhow::Result;
use git2::{Oid, Repository, RepositoryInitOptions};
use std::{
    fs::{create_dir_all, write},
    path::{Path, PathBuf},
};

pub(crate) struct RepoFixture {
    repo: Repository,
}

impl RepoFixture {
    pub(crate) fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(path.as_ref(), &opts)?;
        Self::with_identity(repo)
    }

    pub(crate) fn clone_of(url: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<Self> {
        let url = url.as_ref().to_string_lossy().into_owned();
        let repo = Repository::clone(&url, path.as_ref())?;
        Self::with_identity(repo)
    }

    fn with_identity(repo: Repository) -> Result<Self> {
        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { repo })
    }

    pub(crate) fn path(&self) -> PathBuf {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.repo.path().to_path_buf())
    }

    pub(crate) fn write(&self, filename: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<()> {
        let path = self.path().join(filename.as_ref());
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, contents.as_ref())?;
        Ok(())
    }

    pub(crate) fn stage(&self, filename: impl AsRef<Path>) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_path(filename.as_ref())?;
        index.write()?;
        Ok(())
    }

    pub(crate) fn commit(&self, message: impl AsRef<str>) -> Result<Oid> {
        // INVARIANT: Always use new tree produced by index.
        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        // INVARIANT: Always determine latest parent commit to append to.
        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message.as_ref(),
            &tree,
            &parents,
        )?;

        Ok(oid)
    }

    pub(crate) fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<Oid> {
        self.write(filename.as_ref(), contents)?;
        self.stage(filename.as_ref())?;
        self.commit(format!("chore: add {:?}", filename.as_ref()))
    }

    pub(crate) fn stash(&mut self) -> Result<()> {
        let signature = self.repo.signature()?;
        self.repo.stash_save(&signature, "wip", None)?;
        Ok(())
    }

    pub(crate) fn detach(&self, oid: Oid) -> Result<()> {
        self.repo.set_head_detached(oid)?;
        Ok(())
    }
}
