use std::path::PathBuf;

use clap::Parser;

use vitrine::flow::{self, FlowConstructor, GraphicsFlow};
use vitrine::gallery::{GalleryFlow, ViewerState};
use vitrine::rain::{self, RainFlow};
use vitrine::resources;

#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about = "An interactive 3D image gallery with ambient rain")]
struct Args {
    /// Directory with the gallery images, shown in filename order.
    #[arg(long, default_value = "assets/images")]
    images: PathBuf,

    /// Number of raindrops in the ambient particle field.
    #[arg(long, default_value_t = rain::DROP_COUNT)]
    drops: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let images_dir = args.images;
    let gallery: FlowConstructor<ViewerState> = Box::new(move |init| {
        Box::pin(async move {
            let images = resources::load_gallery_images(&images_dir)?;
            let flow = GalleryFlow::new(&init, &images)?;
            Ok(Box::new(flow) as Box<dyn GraphicsFlow<ViewerState>>)
        })
    });

    let drops = args.drops;
    let rain: FlowConstructor<ViewerState> = Box::new(move |init| {
        Box::pin(async move {
            Ok(Box::new(RainFlow::new(&init, drops)) as Box<dyn GraphicsFlow<ViewerState>>)
        })
    });

    flow::run(vec![gallery, rain])
}
