/// Named byte-content entries of a ramdisk archive.
///
/// Entry names are `/`-separated and relative to the ramdisk root (`init.rc`,
/// `sbin/adbd`). Patch steps only rewrite entries that already exist.
pub trait Archive {
    fn exists(&self, path: &str) -> bool;

    /// Contents of `path`, or `None` if the archive has no such entry.
    fn read(&self, path: &str) -> Option<&[u8]>;

    /// Replace the contents of `path`.
    fn write(&mut self, path: &str, contents: Vec<u8>);

    /// All entry names in sorted order.
    fn entries(&self) -> Vec<String>;
}
