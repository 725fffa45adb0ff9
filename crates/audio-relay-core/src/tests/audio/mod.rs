mod capture;
mod fragment;
mod resampler;
