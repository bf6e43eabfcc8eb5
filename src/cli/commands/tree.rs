use clap::Args;

use crate::cli::{utils, OutputFormat};
use crate::database::{CategoryRepository, CategoryStore, DatabaseManager};
use crate::database::models::CategoryNode;
use crate::services::CategoryForest;

#[derive(Debug, Args)]
pub struct TreeArgs {
    #[arg(long, help = "Start from this category instead of every root")]
    pub root: Option<i32>,

    #[arg(long, default_value_t = 8, help = "Levels to descend")]
    pub depth: u32,
}

pub async fn handle(args: TreeArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;
    let repository = CategoryRepository::new(pool);
    let depth = i32::try_from(args.depth)?;

    let trees: Vec<CategoryNode> = match args.root {
        Some(id) => vec![repository.fetch_tree(id, depth).await?],
        None => {
            let categories = repository.get_all().await?;
            let roots: Vec<i32> = categories
                .iter()
                .filter(|c| c.parent_category_id.is_none())
                .map(|c| c.category_id)
                .collect();
            let forest = CategoryForest::new(categories);
            roots
                .into_iter()
                .map(|id| forest.subtree(id, args.depth))
                .collect::<Result<_, _>>()?
        }
    };

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&trees)?),
        OutputFormat::Text => {
            for tree in &trees {
                print!("{}", utils::render_tree(tree));
            }
        }
    }
    Ok(())
}
