use serde::Serialize;

use crate::domain::ResolvedEpoch;

const WHU_PHASEBIAS_BASE: &str = "ftp://igs.gnsswhu.cn/pub/whu/phasebias";
const WHU_DAILY_BASE: &str = "ftp://igs.gnsswhu.cn/pub/gps/data/daily";
const IGS_ATX_URL: &str = "https://files.igs.org/pub/station/general/igs20.atx";
const VMF_GRID_BASE: &str = "http://vmf.geo.tuwien.ac.at/trop_products/GRID/2.5x2/VMF1/VMF1_OP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductId {
    Sp3Prev,
    Sp3Cur,
    Sp3Next,
    Clk,
    Erp,
    Bia,
    Atx,
    Nav,
    Vmf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subdir {
    Common,
    Vmf,
}

impl Subdir {
    pub fn as_str(self) -> &'static str {
        match self {
            Subdir::Common => "common",
            Subdir::Vmf => "vmf",
        }
    }
}

impl ProductId {
    pub const ALL: [ProductId; 9] = [
        ProductId::Sp3Prev,
        ProductId::Sp3Cur,
        ProductId::Sp3Next,
        ProductId::Clk,
        ProductId::Erp,
        ProductId::Bia,
        ProductId::Atx,
        ProductId::Nav,
        ProductId::Vmf,
    ];

    pub fn subdir(self) -> Subdir {
        match self {
            ProductId::Vmf => Subdir::Vmf,
            _ => Subdir::Common,
        }
    }

    // Orbit coverage spans midnight, so SP3 files are pulled for the day
    // before and after as well. The day offset is substituted into the same
    // year's template: a request on 1 January asks for day 000 of that year.
    fn locators(self, epoch: &ResolvedEpoch) -> Vec<String> {
        let year = epoch.year;
        let doy = i64::from(epoch.doy);
        match self {
            ProductId::Sp3Prev => vec![wum_url(year, doy - 1, "orbit", "01D_05M_ORB.SP3.gz")],
            ProductId::Sp3Cur => vec![wum_url(year, doy, "orbit", "01D_05M_ORB.SP3.gz")],
            ProductId::Sp3Next => vec![wum_url(year, doy + 1, "orbit", "01D_05M_ORB.SP3.gz")],
            ProductId::Clk => vec![wum_url(year, doy, "clock", "01D_30S_CLK.CLK.gz")],
            ProductId::Erp => vec![wum_url(year, doy, "orbit", "01D_01D_ERP.ERP.gz")],
            ProductId::Bia => vec![wum_url(year, doy, "bias", "01D_01D_OSB.BIA.gz")],
            ProductId::Atx => vec![IGS_ATX_URL.to_string()],
            ProductId::Nav => vec![format!(
                "{WHU_DAILY_BASE}/{year}/{doy:03}/{yy:02}p/BRDM00DLR_S_{year}{doy:03}0000_01D_MN.rnx.gz",
                yy = year.rem_euclid(100),
            )],
            ProductId::Vmf => (0..24)
                .step_by(6)
                .map(|hour| {
                    format!(
                        "{VMF_GRID_BASE}/{year}/VMFG_{year}{month:02}{day:02}.H{hour:02}",
                        month = epoch.month(),
                        day = epoch.day(),
                    )
                })
                .collect(),
        }
    }
}

fn wum_url(year: i32, doy: i64, group: &str, tail: &str) -> String {
    format!("{WHU_PHASEBIAS_BASE}/{year}/{group}/WUM0MGXRAP_{year}{doy:03}0000_{tail}")
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub product: ProductId,
    pub url: String,
    pub subdir: Subdir,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductManifest {
    pub entries: Vec<ManifestEntry>,
}

impl ProductManifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn build_manifest(epoch: &ResolvedEpoch) -> ProductManifest {
    let mut entries = Vec::new();
    for product in ProductId::ALL {
        for url in product.locators(epoch) {
            let filename = url.rsplit('/').next().unwrap_or(url.as_str()).to_string();
            entries.push(ManifestEntry {
                product,
                subdir: product.subdir(),
                filename,
                url,
            });
        }
    }
    ProductManifest { entries }
}
