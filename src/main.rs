use std::path::PathBuf;

use nifti_volume::{item_list::MriSegItemList, volume::ShowOptions};

fn main() {
    env_logger::init();
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .expect("usage: nifti-volume <scan.nii.gz>");
    let list = MriSegItemList::new(vec![path.clone()]);
    let volume = list
        .inner
        .open(&path)
        .expect("should have opened the NIfTI scan");
    let strip = volume.show(&ShowOptions::default(), None);
    strip
        .save("result.png")
        .expect("should have saved the preview strip");
}
