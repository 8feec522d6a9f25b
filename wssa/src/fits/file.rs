//! FITS file handle.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::headers::ReadsKey;
use fitsio::tables::ReadsCol;
use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

use super::error::{FitsError, Result};
use super::image::ImageSection;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const INFLATE_CHUNK: usize = 64 * 1024;

/// An open FITS file.
///
/// Gzip-compressed files (detected by their magic bytes) are inflated into
/// a temporary file that lives as long as the handle.
pub struct FitsFile {
    path: PathBuf,
    fptr: fitsio::FitsFile,
    _inflated: Option<NamedTempFile>,
}

impl fmt::Debug for FitsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitsFile")
            .field("path", &self.path)
            .field("inflated", &self._inflated.is_some())
            .finish()
    }
}

/// A binary table HDU and its column names.
pub struct TableHdu {
    index: usize,
    hdu: FitsHdu,
    columns: Vec<String>,
    rows: usize,
}

impl TableHdu {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// FITS column names compare case-insensitively.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }
}

impl FitsFile {
    /// Open a FITS file, inflating it first if it is gzip-compressed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let inflated = if is_gzip(&path)? {
            Some(inflate(&path)?)
        } else {
            None
        };
        let target = inflated.as_ref().map_or(path.as_path(), |f| f.path());

        let fptr = fitsio::FitsFile::open(target).map_err(|source| FitsError::Open {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            fptr,
            _inflated: inflated,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn hdu(&mut self, index: usize) -> Result<FitsHdu> {
        Ok(self.fptr.hdu(index)?)
    }

    /// Read the block `x × y` of the 2-d image in HDU `index`.
    ///
    /// Only the requested rows are read. Values come back as `f64` with
    /// the HDU's BSCALE/BZERO applied.
    pub fn read_section(
        &mut self,
        index: usize,
        x: Range<usize>,
        y: Range<usize>,
    ) -> Result<ImageSection> {
        let hdu = self.hdu(index)?;
        let (width, height) = match &hdu.info {
            HduInfo::ImageInfo { shape, .. } if shape.len() == 2 => (shape[1], shape[0]),
            _ => return Err(FitsError::NotAnImage(index)),
        };

        if x.is_empty() || y.is_empty() || x.end > width || y.end > height {
            return Err(FitsError::SectionOutOfBounds {
                x0: x.start,
                x1: x.end,
                y0: y.start,
                y1: y.end,
                width,
                height,
            });
        }

        let mut values = Vec::with_capacity(x.len() * y.len());
        for row in y.clone() {
            let offset = row * width;
            let pixels: Vec<f64> =
                hdu.read_section(&mut self.fptr, offset + x.start, offset + x.end)?;
            values.extend(pixels);
        }

        trace!(
            path = %self.path.display(),
            hdu = index,
            x = ?x,
            y = ?y,
            "Read image section"
        );

        Ok(ImageSection {
            x0: x.start,
            y0: y.start,
            width: x.len(),
            height: y.len(),
            values,
        })
    }

    /// Describe the binary table in HDU `index`.
    pub fn table(&mut self, index: usize) -> Result<TableHdu> {
        let hdu = self.hdu(index)?;
        let (columns, rows) = match &hdu.info {
            HduInfo::TableInfo {
                column_descriptions,
                num_rows,
            } => (
                column_descriptions.iter().map(|c| c.name.clone()).collect(),
                *num_rows,
            ),
            _ => return Err(FitsError::NotATable(index)),
        };

        Ok(TableHdu {
            index,
            hdu,
            columns,
            rows,
        })
    }

    /// Read a whole column of `table`, converted to `T` by cfitsio.
    pub fn column<T: ReadsCol>(&mut self, table: &TableHdu, name: &str) -> Result<Vec<T>> {
        if !table.has_column(name) {
            return Err(FitsError::ColumnNotFound(name.to_string()));
        }
        Ok(table.hdu.read_col(&mut self.fptr, name)?)
    }

    /// Header keyword of HDU `index`, or `None` if absent or unreadable.
    pub fn read_key<T: ReadsKey>(&mut self, index: usize, key: &str) -> Option<T> {
        let hdu = self.hdu(index).ok()?;
        hdu.read_key(&mut self.fptr, key).ok()
    }
}

fn is_gzip(path: &Path) -> Result<bool> {
    let mut file = File::open(path).map_err(|source| FitsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut magic = [0u8; 2];
    Ok(match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(_) => false,
    })
}

/// Inflate `path` into a temporary file, one chunk at a time.
///
/// A compressed stream that ends early keeps everything inflated before
/// the damage. HDUs in that prefix stay readable; reads past it fail in
/// cfitsio.
fn inflate(path: &Path) -> Result<NamedTempFile> {
    let io_error = |source: io::Error| FitsError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut inflated = tempfile::Builder::new()
        .prefix("wssa-")
        .suffix(".fits")
        .tempfile()
        .map_err(io_error)?;

    let mut total = 0usize;
    {
        let mut writer = BufWriter::new(inflated.as_file_mut());
        let mut chunk = vec![0u8; INFLATE_CHUNK];
        loop {
            let n = match decoder.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        inflated = total,
                        error = %e,
                        "Gzip stream ended early"
                    );
                    break;
                }
            };
            writer.write_all(&chunk[..n]).map_err(io_error)?;
            total += n;
        }
        writer.flush().map_err(io_error)?;
    }

    debug!(
        path = %path.display(),
        bytes = total,
        "Inflated gzip FITS file"
    );
    Ok(inflated)
}
