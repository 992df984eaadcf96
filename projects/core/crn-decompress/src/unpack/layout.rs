use crate::error::CrnDecompressError;
use crate::info::LevelInfo;

/// Block and chunk geometry of one level, plus the destination row pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelLayout {
    pub(crate) blocks_x: usize,
    pub(crate) blocks_y: usize,
    pub(crate) chunks_x: usize,
    pub(crate) chunks_y: usize,
    pub(crate) block_size: usize,
    pub(crate) row_pitch: usize,
}

impl LevelLayout {
    /// Resolves `row_pitch` (0 = tightly packed) and checks it.
    ///
    /// A non-zero pitch must be a multiple of 4 and hold a full row of blocks.
    pub(crate) fn new(info: &LevelInfo, row_pitch: u32) -> Result<Self, CrnDecompressError> {
        let minimum = info.blocks_x * info.bytes_per_block;
        let row_pitch = match row_pitch {
            0 => minimum,
            pitch if pitch < minimum || pitch % 4 != 0 => {
                return Err(CrnDecompressError::InvalidRowPitch { pitch, minimum })
            }
            pitch => pitch,
        };

        Ok(Self {
            blocks_x: info.blocks_x as usize,
            blocks_y: info.blocks_y as usize,
            chunks_x: info.blocks_x.div_ceil(2) as usize,
            chunks_y: info.blocks_y.div_ceil(2) as usize,
            block_size: info.bytes_per_block as usize,
            row_pitch: row_pitch as usize,
        })
    }

    /// Bytes each face buffer must hold.
    #[inline]
    pub(crate) fn face_size(&self) -> usize {
        self.row_pitch * self.blocks_y
    }

    /// Checks the destination face buffers.
    pub(crate) fn check_destination(
        &self,
        faces: u32,
        dst: &[&mut [u8]],
    ) -> Result<(), CrnDecompressError> {
        if dst.len() != faces as usize {
            return Err(CrnDecompressError::FaceCountMismatch {
                expected: faces,
                actual: dst.len(),
            });
        }
        let needed = self.face_size();
        match dst.iter().find(|face| face.len() < needed) {
            Some(face) => Err(CrnDecompressError::DestinationTooSmall {
                needed,
                actual: face.len(),
            }),
            None => Ok(()),
        }
    }
}
