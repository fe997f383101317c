use std::{collections::HashSet, sync::Arc};

use clap::Args;
use futures::{stream::FuturesUnordered, StreamExt};

use crate::{
    context::Context,
    entity::{Package, RepoIndex},
    progress::ProgressBar,
};

use super::Command;

#[derive(Args, Clone, Debug)]
pub struct UpdateArgs {
    /// Usually, the update command will not refetch the index if the cached
    /// copy has been refreshed recently.
    ///
    /// This flag disables that check and forces a refetch.
    #[arg(short, long, default_value = "false")]
    force: bool,
    /// After fetching, verify that every source url resolves.
    #[arg(long, default_value = "false")]
    verify: bool,
    /// If specified, only verify the named packages.
    names: Vec<String>,
}

impl UpdateArgs {
    async fn verify_source(
        context: &Context,
        package: &Package,
        pb: Arc<ProgressBar>,
    ) -> anyhow::Result<()> {
        pb.switch_to_spinner();
        pb.set_message(format!("{} -> {}", package.name, package.source_url));

        let response = context.client.head(&package.source_url).send().await;
        pb.finish_and_clear();

        let response = response?;
        if !response.status().is_success() {
            anyhow::bail!(
                "{}: {} answered {}",
                package.name,
                package.source_url,
                response.status()
            );
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for UpdateArgs {
    async fn run(&self, context: &mut Context) -> anyhow::Result<()> {
        let (index, refreshed) = RepoIndex::try_to_fetch(context, self.force).await?;
        if refreshed {
            context.caches.flush_meta().await?;
        }

        if !self.verify {
            println!(
                "{}: {} package(s) indexed",
                index.repository,
                index.packages.len()
            );
            return Ok(());
        }

        let names = self.names.iter().collect::<HashSet<_>>();
        let filter = |package: &&Package| names.is_empty() || names.contains(&package.name);

        let items = index.packages.iter().filter(filter).collect::<Vec<_>>();
        let pb = context.bar.add_root();

        if items.is_empty() {
            pb.finish("No packages to verify");
            return Ok(());
        }

        pb.switch_to_counted(items.len() as u64);
        pb.set_message("Verifying source urls");

        let mut iter = items.iter();
        let mut futures = FuturesUnordered::new();
        let mut broken = Vec::new();

        loop {
            while futures.len() < context.config.limit() {
                let package = match iter.next() {
                    Some(package) => package,
                    None => break,
                };
                let child = context.bar.add_child(&pb);
                futures.push(Self::verify_source(context, package, child));
            }
            if futures.is_empty() {
                break;
            }
            if let Some(res) = futures.next().await {
                if let Err(err) = res {
                    broken.push(err);
                }
                pb.inc(1);
            }
        }

        if broken.is_empty() {
            pb.finish("All source urls resolve");
            return Ok(());
        }

        pb.finish(format!("{} source url(s) do not resolve", broken.len()));
        for err in &broken {
            eprintln!("{}", err);
        }
        anyhow::bail!("{} source url(s) do not resolve", broken.len());
    }
}
