use clap::{Args, ValueEnum};
use fuzzy_matcher::FuzzyMatcher;
use stanza::{
    renderer::{console::Console, Renderer as _},
    style::{Header, Styles},
    table::{Row, Table},
};

use crate::{
    context::Context,
    entity::{Package, RepoIndex},
};

use super::Command;

#[derive(ValueEnum, Clone, Debug, Copy)]
enum Matcher {
    SkimMatcherV1,
    SkimMatcherV2,
    Clangd,
}

#[derive(ValueEnum, Clone, Debug, Copy)]
enum OutputFormat {
    Text,
    Json,
    Table,
}

#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// The matcher to use.
    #[arg(long, default_value = "skim-matcher-v2", value_enum)]
    matcher: Matcher,
    /// The query to match against package names and descriptions.
    keyword: String,
    /// The output format.
    #[arg(long, default_value = "text", value_enum)]
    format: OutputFormat,
}

impl Matcher {
    fn to_matcher(self) -> Box<dyn FuzzyMatcher> {
        match self {
            #[allow(deprecated)]
            Matcher::SkimMatcherV1 => Box::new(fuzzy_matcher::skim::SkimMatcher::default()),
            Matcher::SkimMatcherV2 => Box::new(fuzzy_matcher::skim::SkimMatcherV2::default()),
            Matcher::Clangd => Box::new(fuzzy_matcher::clangd::ClangdMatcher::default()),
        }
    }
}

trait Outputs {
    fn output(&self, packages: &[(&Package, i64)]);
}

struct TextOutput;

impl Outputs for TextOutput {
    fn output(&self, packages: &[(&Package, i64)]) {
        for (package, _) in packages {
            println!("{}\t{}", package.name, package.description);
        }
    }
}

struct JsonOutput;

impl Outputs for JsonOutput {
    fn output(&self, packages: &[(&Package, i64)]) {
        let packages = packages
            .iter()
            .map(|(package, score)| {
                serde_json::json!({
                    "package": package,
                    "score": score,
                })
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string(&packages).unwrap());
    }
}

struct TableOutput;

impl Outputs for TableOutput {
    fn output(&self, packages: &[(&Package, i64)]) {
        // build a table model
        let mut table = Table::default().with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Name".into(),
                "Version".into(),
                "Category".into(),
                "Score".into(),
            ],
        ));
        for (package, score) in packages {
            table.push_row(vec![
                package.name.clone(),
                package.version.clone(),
                package.category.clone(),
                format!("{}", score),
            ]);
        }
        let renderer = Console::default();
        println!("{}", renderer.render(&table));
    }
}

impl OutputFormat {
    fn to_output(self) -> Box<dyn Outputs> {
        match self {
            OutputFormat::Text => Box::new(TextOutput),
            OutputFormat::Json => Box::new(JsonOutput),
            OutputFormat::Table => Box::new(TableOutput),
        }
    }
}

#[async_trait::async_trait]
impl Command for SearchArgs {
    async fn run(&self, context: &mut Context) -> anyhow::Result<()> {
        let matcher = self.matcher.to_matcher();
        let (index, refreshed) = RepoIndex::try_to_fetch(context, false).await?;
        if refreshed {
            context.caches.flush_meta().await?;
        }

        let mut packages = index
            .packages
            .iter()
            .filter_map(|package| {
                matcher
                    .fuzzy_match(&package.name, &self.keyword)
                    .or_else(|| matcher.fuzzy_match(&package.description, &self.keyword))
                    .map(|score| (package, score))
            })
            .collect::<Vec<_>>();
        packages.sort_by(|a, b| b.1.cmp(&a.1));

        let outputs = self.format.to_output();
        outputs.output(&packages);

        Ok(())
    }
}
