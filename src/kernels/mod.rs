pub(crate) mod blend;
pub(crate) mod blur;
pub(crate) mod convolve;
pub(crate) mod histogram;
pub(crate) mod lut;
