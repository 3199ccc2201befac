//! Image store command handlers.

use std::path::Path;

use anyhow::Result;

use stowage_media::{ImageStore, ImageStoreConfig, ImageVariant, Size, open_image};

use crate::commands::ImageCommand;
use crate::{CliContext, CliError};

/// Dispatch an image subcommand.
pub fn execute(ctx: &CliContext, command: ImageCommand) -> Result<()> {
    match command {
        ImageCommand::Save {
            file,
            name,
            max_width,
            max_height,
            thumbnail,
            quality,
        } => {
            let mut config = ImageStoreConfig::default()
                .with_max_size(Size::new(max_width, max_height))
                .with_quality(quality);
            if let Some((width, height)) = thumbnail {
                config = config.with_thumbnails(Size::new(width, height));
            }
            save(&ctx.images(config), &file, name.as_deref())
        }
        ImageCommand::Path { name, thumbnail } => {
            let variant = if thumbnail {
                ImageVariant::Thumbnail
            } else {
                ImageVariant::Original
            };
            let store = ctx.images(ImageStoreConfig::default().with_thumbnails(Size::ZERO));
            let path = store.path_for(&name, variant).map_err(CliError::from)?;
            println!("{}", path.display());
            Ok(())
        }
        ImageCommand::Rename { old, new } => {
            existing(ctx, &old)?.rename(&old, &new).map_err(CliError::from)?;
            println!("Renamed {old} -> {new}");
            Ok(())
        }
        ImageCommand::Remove { name } => {
            existing(ctx, &name)?.delete(&name).map_err(CliError::from)?;
            println!("Removed {name}");
            Ok(())
        }
    }
}

fn save(store: &ImageStore, file: &Path, name: Option<&str>) -> Result<()> {
    let image = open_image(file).map_err(CliError::from)?;
    let name = match name {
        Some(name) => {
            store.save_named(&image, name).map_err(CliError::from)?;
            name.to_string()
        }
        None => store.save(&image).map_err(CliError::from)?,
    };

    println!("Saved {name}");
    println!("  original  = {}", store.path_for(&name, ImageVariant::Original)?.display());
    if !store.config().ignore_thumbnail {
        println!("  thumbnail = {}", store.path_for(&name, ImageVariant::Thumbnail)?.display());
    }
    Ok(())
}

/// Store configured to touch a thumbnail only when one exists for `name`.
fn existing(ctx: &CliContext, name: &str) -> Result<ImageStore> {
    let with_thumbnails = ctx.images(ImageStoreConfig::default().with_thumbnails(Size::ZERO));
    let has_thumbnail = with_thumbnails
        .path_for(name, ImageVariant::Thumbnail)
        .map_err(CliError::from)?
        .is_file();
    Ok(if has_thumbnail {
        with_thumbnails
    } else {
        ctx.images(ImageStoreConfig::default())
    })
}
