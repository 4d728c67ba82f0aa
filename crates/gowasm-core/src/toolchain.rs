//! Toolchain initialization.
//!
//! Every module binary and support archive is fetched concurrently and the
//! fetches are joined before anything else happens. A [`Toolchain`] only
//! exists once all of them succeeded.

use futures::future::try_join_all;
use gowasm_transport::AssetSource;
use tracing::{debug, info};

use crate::error::PlaygroundError;
use crate::layout::{self, SupportArchive, Tool, SUPPORT_ARCHIVES};
use crate::runtime::ModuleImage;
use crate::vfs::FileStore;

/// The loaded module binaries. Immutable after initialization.
#[derive(Debug, Clone)]
pub struct Toolchain {
    compile: ModuleImage,
    link: ModuleImage,
    gofmt: ModuleImage,
}

impl Toolchain {
    pub fn new(compile: ModuleImage, link: ModuleImage, gofmt: ModuleImage) -> Self {
        Self {
            compile,
            link,
            gofmt,
        }
    }

    pub fn image(&self, tool: Tool) -> &ModuleImage {
        match tool {
            Tool::Compile => &self.compile,
            Tool::Link => &self.link,
            Tool::Gofmt => &self.gofmt,
        }
    }

    /// Fetch every asset, install the archives and import configs into
    /// `fs`, and return the module binaries.
    ///
    /// Nothing is written to `fs` unless every fetch succeeded.
    pub async fn load(
        source: &dyn AssetSource,
        fs: &dyn FileStore,
    ) -> Result<Self, PlaygroundError> {
        info!(source = %source.describe(), "loading toolchain assets");

        let tools = try_join_all(Tool::ALL.iter().map(|tool| fetch_tool(source, *tool)));
        let archives = try_join_all(SUPPORT_ARCHIVES.iter().map(|a| fetch_archive(source, a)));
        let (tools, archives) = futures::try_join!(tools, archives)?;

        for (archive, bytes) in archives {
            fs.write(&archive.vfs_path(), bytes);
        }
        fs.write(layout::IMPORTCFG_PATH, layout::compile_importcfg().into_bytes());
        fs.write(layout::IMPORTCFG_LINK_PATH, layout::link_importcfg().into_bytes());

        let mut images = tools.into_iter();
        let (Some(compile), Some(link), Some(gofmt)) = (images.next(), images.next(), images.next())
        else {
            return Err(PlaygroundError::asset_load("cmd", "toolchain incomplete"));
        };

        info!("toolchain ready");
        Ok(Self::new(compile, link, gofmt))
    }
}

async fn fetch_tool(source: &dyn AssetSource, tool: Tool) -> Result<ModuleImage, PlaygroundError> {
    let path = tool.asset_path();
    let bytes = source
        .fetch(&path)
        .await
        .map_err(|e| PlaygroundError::asset_load(path.clone(), e))?;
    if bytes.is_empty() {
        return Err(PlaygroundError::asset_load(path, "empty module binary"));
    }
    debug!(tool = tool.name(), len = bytes.len(), "module binary loaded");
    Ok(ModuleImage::new(tool.name(), bytes))
}

async fn fetch_archive(
    source: &dyn AssetSource,
    archive: &'static SupportArchive,
) -> Result<(&'static SupportArchive, Vec<u8>), PlaygroundError> {
    let path = archive.asset_path();
    let bytes = source
        .fetch(&path)
        .await
        .map_err(|e| PlaygroundError::asset_load(path, e))?;
    debug!(package = archive.package, len = bytes.len(), "support archive loaded");
    Ok((archive, bytes))
}
