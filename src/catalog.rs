//! Static knowledge of every NVRAM identifier known to Z-Stack.
//!
//! The extended NV item ids form the [`Namespace`] set. Only [`Namespace::Legacy`] is
//! subdivided: its sub-id space holds the individually named [`LegacyItem`]s and a
//! handful of contiguous [`LegacyTable`]s. All other namespaces are plain arrays indexed
//! by sub-id.

use std::ops::RangeInclusive;
use std::sync::Once;

/// Top-level storage regions, the Z-Stack "extended NV" item ids.
#[derive(
    strum::FromRepr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[repr(u16)]
pub enum Namespace {
    #[strum(serialize = "LEGACY")]
    Legacy = 0x0000,
    #[strum(serialize = "ADDRMGR")]
    AddrMgr = 0x0001,
    #[strum(serialize = "BINDING_TABLE")]
    BindingTable = 0x0002,
    #[strum(serialize = "DEVICE_LIST")]
    DeviceList = 0x0003,
    #[strum(serialize = "TCLK_TABLE")]
    TclkTable = 0x0004,
    #[strum(serialize = "TCLK_IC_TABLE")]
    TclkIcTable = 0x0005,
    #[strum(serialize = "APS_KEY_DATA_TABLE")]
    ApsKeyDataTable = 0x0006,
    #[strum(serialize = "NWK_SEC_MATERIAL_TABLE")]
    NwkSecMaterialTable = 0x0007,
}

impl Namespace {
    pub const fn id(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

macro_rules! legacy_items {
    ($($variant:ident = $id:literal => $name:literal,)+) => {
        /// Named items of the [`Namespace::Legacy`] namespace that are not part of a table.
        #[derive(
            strum::FromRepr,
            strum::Display,
            strum::EnumString,
            strum::EnumIter,
            strum::IntoStaticStr,
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
        )]
        #[repr(u16)]
        pub enum LegacyItem {
            $(
                #[strum(serialize = $name)]
                $variant = $id,
            )+
        }
    };
}

legacy_items! {
    // OSAL
    ExtAddr = 0x0001 => "EXTADDR",
    BootCounter = 0x0002 => "BOOTCOUNTER",
    StartupOption = 0x0003 => "STARTUP_OPTION",
    StartDelay = 0x0004 => "START_DELAY",

    // NWK
    Nib = 0x0021 => "NIB",
    DeviceList = 0x0022 => "DEVICE_LIST",
    AddrMgr = 0x0023 => "ADDRMGR",
    PollRateOld16 = 0x0024 => "POLL_RATE_OLD16",
    QueuedPollRate = 0x0025 => "QUEUED_POLL_RATE",
    ResponsePollRate = 0x0026 => "RESPONSE_POLL_RATE",
    RejoinPollRate = 0x0027 => "REJOIN_POLL_RATE",
    DataRetryCnt = 0x0028 => "DATA_RETRY_CNT",
    PollFailureRetryCnt = 0x0029 => "POLL_FAILURE_RETRY_CNT",
    StackProfile = 0x002A => "STACK_PROFILE",
    IndirectMsgTimeout = 0x002B => "INDIRECT_MSG_TIMEOUT",
    RouteExpiryTime = 0x002C => "ROUTE_EXPIRY_TIME",
    ExtendedPanId = 0x002D => "EXTENDED_PAN_ID",
    BcastRetries = 0x002E => "BCAST_RETRIES",
    PassiveAckTimeout = 0x002F => "PASSIVE_ACK_TIMEOUT",
    BcastDeliveryTime = 0x0030 => "BCAST_DELIVERY_TIME",
    NwkMode = 0x0031 => "NWK_MODE",
    ConcentratorEnable = 0x0032 => "CONCENTRATOR_ENABLE",
    ConcentratorDiscovery = 0x0033 => "CONCENTRATOR_DISCOVERY",
    ConcentratorRadius = 0x0034 => "CONCENTRATOR_RADIUS",
    PollRate = 0x0035 => "POLL_RATE",
    ConcentratorRc = 0x0036 => "CONCENTRATOR_RC",
    NwkMgrMode = 0x0037 => "NWK_MGR_MODE",
    SrcRtgExpiryTime = 0x0038 => "SRC_RTG_EXPIRY_TIME",
    RouteDiscoveryTime = 0x0039 => "ROUTE_DISCOVERY_TIME",
    NwkActiveKeyInfo = 0x003A => "NWK_ACTIVE_KEY_INFO",
    NwkAlternKeyInfo = 0x003B => "NWK_ALTERN_KEY_INFO",
    RouterOffAssocCleanup = 0x003C => "ROUTER_OFF_ASSOC_CLEANUP",
    NwkLeaveReqAllowed = 0x003D => "NWK_LEAVE_REQ_ALLOWED",
    NwkChildAgeEnable = 0x003E => "NWK_CHILD_AGE_ENABLE",
    DeviceListKaTimeout = 0x003F => "DEVICE_LIST_KA_TIMEOUT",

    // APS
    BindingTable = 0x0041 => "BINDING_TABLE",
    GroupTable = 0x0042 => "GROUP_TABLE",
    ApsFrameRetries = 0x0043 => "APS_FRAME_RETRIES",
    ApsAckWaitDuration = 0x0044 => "APS_ACK_WAIT_DURATION",
    ApsAckWaitMultiplier = 0x0045 => "APS_ACK_WAIT_MULTIPLIER",
    BindingTime = 0x0046 => "BINDING_TIME",
    ApsUseExtPanId = 0x0047 => "APS_USE_EXT_PANID",
    ApsUseInsecureJoin = 0x0048 => "APS_USE_INSECURE_JOIN",
    CommissionedNwkAddr = 0x0049 => "COMMISSIONED_NWK_ADDR",
    ApsNonmemberRadius = 0x004B => "APS_NONMEMBER_RADIUS",
    ApsLinkKeyTable = 0x004C => "APS_LINK_KEY_TABLE",
    ApsDuprejTimeoutInc = 0x004D => "APS_DUPREJ_TIMEOUT_INC",
    ApsDuprejTimeoutCount = 0x004E => "APS_DUPREJ_TIMEOUT_COUNT",
    ApsDuprejTableSize = 0x004F => "APS_DUPREJ_TABLE_SIZE",
    DiagnosticStats = 0x0050 => "DIAGNOSTIC_STATS",
    NwkParentInfo = 0x0051 => "NWK_PARENT_INFO",
    NwkEnddevTimeoutDef = 0x0052 => "NWK_ENDDEV_TIMEOUT_DEF",
    EndDevTimeoutValue = 0x0053 => "END_DEV_TIMEOUT_VALUE",
    EndDevConfiguration = 0x0054 => "END_DEV_CONFIGURATION",
    BdbNodeIsOnANetwork = 0x0055 => "BDBNODEISONANETWORK",
    BdbReportingConfig = 0x0056 => "BDBREPORTINGCONFIG",

    // Written by other host stacks to remember that they configured the device
    HasConfiguredZstack3 = 0x0060 => "HAS_CONFIGURED_ZSTACK3",

    // Security
    SecurityLevel = 0x0061 => "SECURITY_LEVEL",
    PrecfgKey = 0x0062 => "PRECFGKEY",
    PrecfgKeysEnable = 0x0063 => "PRECFGKEYS_ENABLE",
    SecurityMode = 0x0064 => "SECURITY_MODE",
    SecurePermitJoin = 0x0065 => "SECURE_PERMIT_JOIN",
    ApsLinkKeyType = 0x0066 => "APS_LINK_KEY_TYPE",
    ApsAllowR19Security = 0x0067 => "APS_ALLOW_R19_SECURITY",
    DistributedKey = 0x0068 => "DISTRIBUTED_KEY",
    ImplicitCertificate = 0x0069 => "IMPLICIT_CERTIFICATE",
    DevicePrivateKey = 0x006A => "DEVICE_PRIVATE_KEY",
    CaPublicKey = 0x006B => "CA_PUBLIC_KEY",
    KeMaxDevices = 0x006C => "KE_MAX_DEVICES",
    UseDefaultTclk = 0x006D => "USE_DEFAULT_TCLK",
    RngCounter = 0x006F => "RNG_COUNTER",
    RandomSeed = 0x0070 => "RANDOM_SEED",
    TrustCenterAddr = 0x0071 => "TRUSTCENTER_ADDR",
    Cert283 = 0x0072 => "CERT_283",
    PrivateKey283 = 0x0073 => "PRIVATE_KEY_283",
    PublicKey283 = 0x0074 => "PUBLIC_KEY_283",

    // ZDO
    UserDesc = 0x0081 => "USERDESC",
    NwkKey = 0x0082 => "NWKKEY",
    PanId = 0x0083 => "PANID",
    ChanList = 0x0084 => "CHANLIST",
    LeaveCtrl = 0x0085 => "LEAVE_CTRL",
    ScanDuration = 0x0086 => "SCAN_DURATION",
    LogicalType = 0x0087 => "LOGICAL_TYPE",
    NwkMgrMinTx = 0x0088 => "NWKMGR_MIN_TX",
    NwkMgrAddr = 0x0089 => "NWKMGR_ADDR",
    ZdoDirectCb = 0x008F => "ZDO_DIRECT_CB",

    // ZCL
    SceneTable = 0x0091 => "SCENE_TABLE",
    MinFreeNwkAddr = 0x0092 => "MIN_FREE_NWK_ADDR",
    MaxFreeNwkAddr = 0x0093 => "MAX_FREE_NWK_ADDR",
    MinFreeGrpId = 0x0094 => "MIN_FREE_GRP_ID",
    MaxFreeGrpId = 0x0095 => "MAX_FREE_GRP_ID",
    MinGrpIds = 0x0096 => "MIN_GRP_IDS",
    MaxGrpIds = 0x0097 => "MAX_GRP_IDS",
    OtaBlockReqDelay = 0x0098 => "OTA_BLOCK_REQ_DELAY",

    SapiEndpoint = 0x00A1 => "SAPI_ENDPOINT",

    // Commissioning cluster startup attribute set
    SasShortAddr = 0x00B1 => "SAS_SHORT_ADDR",
    SasExtPanId = 0x00B2 => "SAS_EXT_PANID",
    SasPanId = 0x00B3 => "SAS_PANID",
    SasChannelMask = 0x00B4 => "SAS_CHANNEL_MASK",
    SasProtocolVer = 0x00B5 => "SAS_PROTOCOL_VER",
    SasStackProfile = 0x00B6 => "SAS_STACK_PROFILE",
    SasStartupCtrl = 0x00B7 => "SAS_STARTUP_CTRL",
    SasTcAddr = 0x00C1 => "SAS_TC_ADDR",
    SasTcMasterKey = 0x00C2 => "SAS_TC_MASTER_KEY",
    SasNwkKey = 0x00C3 => "SAS_NWK_KEY",
    SasUseInsecJoin = 0x00C4 => "SAS_USE_INSEC_JOIN",
    SasPrecfgLinkKey = 0x00C5 => "SAS_PRECFG_LINK_KEY",
    SasNwkKeySeqNum = 0x00C6 => "SAS_NWK_KEY_SEQ_NUM",
    SasNwkKeyType = 0x00C7 => "SAS_NWK_KEY_TYPE",
    SasNwkMgrAddr = 0x00C8 => "SAS_NWK_MGR_ADDR",
    SasCurrTcMasterKey = 0x00D1 => "SAS_CURR_TC_MASTER_KEY",
    SasCurrNwkKey = 0x00D2 => "SAS_CURR_NWK_KEY",
    SasCurrPrecfgLinkKey = 0x00D3 => "SAS_CURR_PRECFG_LINK_KEY",

    UseNvocmp = 0x00FF => "USE_NVOCMP",

    // Trust center link keys
    TclkSeed = 0x0101 => "TCLK_SEED",
    TclkJoinDev = 0x0102 => "TCLK_JOIN_DEV",
    TclkDefault = 0x0103 => "TCLK_DEFAULT",

    DuplicateBindingTable = 0x0300 => "DUPLICATE_BINDING_TABLE",
    DuplicateDeviceList = 0x0301 => "DUPLICATE_DEVICE_LIST",
    DuplicateDeviceListKaTimeout = 0x0302 => "DUPLICATE_DEVICE_LIST_KA_TIMEOUT",

    HasConfiguredZstack1 = 0x0F00 => "HAS_CONFIGURED_ZSTACK1",
    AppItem1 = 0x0F01 => "APP_ITEM_1",
    AppItem2 = 0x0F02 => "APP_ITEM_2",
    AppItem3 = 0x0F03 => "APP_ITEM_3",
    AppItem4 = 0x0F04 => "APP_ITEM_4",
    AppItem5 = 0x0F05 => "APP_ITEM_5",
    AppItem6 = 0x0F06 => "APP_ITEM_6",

    InvalidIndex = 0xFFFF => "INVALID_INDEX",
}

impl LegacyItem {
    pub const fn id(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A contiguous, inclusive range of [`Namespace::Legacy`] sub-ids holding the elements
/// of one table. Element `n` lives at sub-id `start + n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyTable {
    /// Name of the table, which is also the name of its first sub-id.
    pub name: &'static str,
    pub start: u16,
    pub end: u16,
}

impl LegacyTable {
    const fn new(name: &'static str, start: u16, end: u16) -> Self {
        Self { name, start, end }
    }

    pub const fn contains(&self, sub_id: u16) -> bool {
        self.start <= sub_id && sub_id <= self.end
    }

    /// Number of elements in the table.
    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Always false for the tables in [`TABLES`], which are checked to be non-empty.
    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn sub_ids(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

/// All tables of the legacy namespace, sorted by their start sub-id.
pub const TABLES: &[LegacyTable] = &[
    LegacyTable::new("LEGACY_NWK_SEC_MATERIAL_TABLE_START", 0x0075, 0x0080),
    LegacyTable::new("LEGACY_TCLK_IC_TABLE_START", 0x0104, 0x0110),
    LegacyTable::new("LEGACY_TCLK_TABLE_START", 0x0111, 0x01FF),
    LegacyTable::new("APS_LINK_KEY_DATA_START", 0x0201, 0x02FF),
    LegacyTable::new("LEGACY_PROXY_TABLE_START", 0x0310, 0x031F),
    LegacyTable::new("LEGACY_SINK_TABLE_START", 0x0320, 0x032F),
];

/// Returns the table whose range contains `sub_id`, if any.
pub fn table_containing(sub_id: u16) -> Option<&'static LegacyTable> {
    ensure_valid();

    // Tables are sorted and disjoint, so only the last table starting at or before
    // `sub_id` can contain it.
    let idx = TABLES.partition_point(|table| table.start <= sub_id);
    idx.checked_sub(1)
        .map(|i| &TABLES[i])
        .filter(|table| table.contains(sub_id))
}

pub fn table_by_name(name: &str) -> Option<&'static LegacyTable> {
    TABLES.iter().find(|table| table.name == name)
}

/// Every addressable sub-id of the legacy namespace, ascending: all named items and
/// every member of every table.
pub fn legacy_sub_ids() -> Vec<u16> {
    ensure_valid();

    let mut ids: Vec<u16> = <LegacyItem as strum::IntoEnumIterator>::iter()
        .map(LegacyItem::id)
        .chain(TABLES.iter().flat_map(LegacyTable::sub_ids))
        .collect();
    ids.sort_unstable();
    ids
}

/// Checks the catalog invariants once per process. A violation is a defect in the
/// tables above, so it panics.
pub(crate) fn ensure_valid() {
    static CHECKED: Once = Once::new();
    CHECKED.call_once(validate);
}

fn validate() {
    for table in TABLES {
        assert!(
            !table.is_empty(),
            "table {} has an empty range",
            table.name
        );
    }

    for pair in TABLES.windows(2) {
        assert!(
            pair[0].end < pair[1].start,
            "tables {} and {} overlap or are not sorted",
            pair[0].name,
            pair[1].name
        );
    }

    for item in <LegacyItem as strum::IntoEnumIterator>::iter() {
        if let Some(table) = TABLES.iter().find(|table| table.contains(item.id())) {
            panic!("item {item} (0x{:04X}) overlaps table {}", item.id(), table.name);
        }
        assert!(
            table_by_name(item.name()).is_none(),
            "item {item} shares its name with a table"
        );
    }
}
