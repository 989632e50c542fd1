// Input adapters, one per upstream source.

pub mod fiscal_workbook;
pub mod population;
pub mod rankings;
pub mod tax_burden;
